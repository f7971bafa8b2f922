//! Sample records shared by tests.
//!
//! One fully populated case (`case-1`) with two assignees and two offices.
//! The case has no case password, so templates using
//! `{case.case_password}` always stop for input.

use chrono::{TimeZone, Utc};

use crate::models::{
    CaseRecord, Contact, Details, ImmigrationCase, Office, PaymentPlan, PersonalData,
    Questionnaire, TemplateCategory, TemplateReference, User, UserRole,
};
use crate::store::{MemoryRecordStore, RecordsFile};

pub fn case_record() -> CaseRecord {
    CaseRecord {
        id: "case-1".to_string(),
        name: "Jan Kowalski".to_string(),
        assignee_ids: vec!["user-1".to_string(), "user-2".to_string()],
        last_activity_date: "2026-10-01".to_string(),
        case_description: Some("Temporary residence permit".to_string()),
        contact: Contact {
            phone: Some("+48 600 100 200".to_string()),
            email: Some("jan.kowalski@example.com".to_string()),
        },
        details: Details {
            nationality: Some("Ukrainian".to_string()),
            passport_number: Some("FX123456".to_string()),
        },
        immigration_case: ImmigrationCase {
            office_id: "office-1".to_string(),
            case_number: Some("WSC-II-S.6151.1234.2026".to_string()),
            case_password: None,
            is_transferring: Some(false),
            transfer_office_id: None,
        },
        questionnaire: Some(Questionnaire {
            personal_data: Some(PersonalData {
                surname: Some("Kowalski".to_string()),
                name: Some("Jan".to_string()),
                date_of_birth: Some("1990-01-01".to_string()),
                citizenship: Some("Ukrainian".to_string()),
                pesel: None,
                ..PersonalData::default()
            }),
            place_of_residence_in_poland: Some("Warszawa".to_string()),
            ..Questionnaire::default()
        }),
        payment_plan: Some(PaymentPlan::FullPayment),
    }
}

pub fn users() -> Vec<User> {
    vec![
        User {
            id: "user-1".to_string(),
            name: "Anna Nowak".to_string(),
            username: "anowak".to_string(),
            phone: Some("+48 22 100 10 10".to_string()),
            role: UserRole::Admin,
            ..User::default()
        },
        User {
            id: "user-2".to_string(),
            name: "Piotr Wiśniewski".to_string(),
            username: "pwisniewski".to_string(),
            ..User::default()
        },
    ]
}

pub fn offices() -> Vec<Office> {
    vec![
        Office {
            id: "office-1".to_string(),
            name: "Mazowiecki Urząd Wojewódzki".to_string(),
            address: "pl. Bankowy 3/5, 00-950 Warszawa".to_string(),
        },
        Office {
            id: "office-2".to_string(),
            name: "Lubuski Urząd Wojewódzki".to_string(),
            address: "ul. Jagiellończyka 8, 66-400 Gorzów Wielkopolski".to_string(),
        },
    ]
}

/// A standard template whose binary lives at `<id>.docx`.
pub fn template(id: &str, name: &str) -> TemplateReference {
    TemplateReference {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} template"),
        storage_path: format!("{id}.docx"),
        category: TemplateCategory::Standard,
        usage_count: 0,
        uploaded_by: Some("user-1".to_string()),
        created_at: Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).single(),
    }
}

/// In-memory record store holding the sample case, users and offices.
pub fn record_store() -> MemoryRecordStore {
    let store = MemoryRecordStore::new();
    store.insert_case(case_record());
    for user in users() {
        store.insert_user(user);
    }
    for office in offices() {
        store.insert_office(office);
    }
    store
}

/// The same data as [`record_store`], as the contents of a store directory.
pub fn records_file() -> RecordsFile {
    RecordsFile {
        cases: vec![case_record()],
        users: users(),
        offices: offices(),
        templates: Vec::new(),
        audit: Vec::new(),
    }
}
