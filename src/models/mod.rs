//! Shared data models for document generation
//!
//! These are the entities the generation pipeline reads from the record store:
//! the case record (with its questionnaire), the users assigned to it, the
//! immigration office it belongs to, and the template references.
//!
//! Optional fields serialize as `null` rather than being skipped. The context
//! builder copies the questionnaire through as JSON, and templates rely on
//! every known key being present even when it has no value yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact block of a case record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Identity details of the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Details {
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
}

/// The office-side state of the case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImmigrationCase {
    /// Office handling the case
    pub office_id: String,
    pub case_number: Option<String>,
    pub case_password: Option<String>,
    /// Whether the case is being moved to another office
    pub is_transferring: Option<bool>,
    pub transfer_office_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentPlan {
    #[serde(rename = "Full Payment")]
    FullPayment,
    #[serde(rename = "2 Installments")]
    TwoInstallments,
    #[serde(rename = "3 Installments")]
    ThreeInstallments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Education {
    Primary,
    Secondary,
    Higher,
    #[serde(rename = "None")]
    NoEducation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// Personal data section of the questionnaire.
///
/// Dates are kept as `YYYY-MM-DD` strings exactly as entered; the height is
/// free text in centimetres.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalData {
    pub surname: Option<String>,
    pub previously_used_surnames: Option<String>,
    pub family_name: Option<String>,
    pub name: Option<String>,
    pub previously_used_names: Option<String>,
    pub fathers_name: Option<String>,
    pub mothers_name: Option<String>,
    pub mothers_maiden_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_birth: Option<String>,
    pub country_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub citizenship: Option<String>,
    pub marital_status: Option<MaritalStatus>,
    pub education: Option<Education>,
    pub height: Option<String>,
    pub eye_color: Option<String>,
    pub special_marks: Option<String>,
    pub pesel: Option<String>,
    pub telephone_number: Option<String>,
    pub email: Option<String>,
}

/// One stay outside the country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelEntry {
    pub id: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub country: Option<String>,
}

/// A family member residing in the country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyMember {
    pub id: String,
    pub full_name: Option<String>,
    pub sex: Option<Sex>,
    pub date_of_birth: Option<String>,
    pub degree_of_kinship: Option<String>,
    pub citizenship: Option<String>,
    pub place_of_residence: Option<String>,
    pub is_applying: Option<bool>,
    pub is_dependent: Option<bool>,
}

/// The questionnaire sub-record.
///
/// Loop and conditional blocks in templates address this structure directly,
/// e.g. `{#questionnaire.family_members_in_poland}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Questionnaire {
    pub personal_data: Option<PersonalData>,
    pub place_of_residence_in_poland: Option<String>,
    pub last_entry_date_to_poland: Option<String>,
    pub travels_and_stays_outside_poland: Vec<TravelEntry>,
    pub has_family_in_poland: Option<bool>,
    pub family_members_in_poland: Vec<FamilyMember>,
    pub was_sentenced_in_poland: Option<bool>,
    pub is_subject_of_criminal_proceedings: Option<bool>,
    pub has_liabilities: Option<bool>,
}

/// The persistent case record documents are generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseRecord {
    pub id: String,
    /// Client's full name
    pub name: String,
    /// Assigned users; the first entry is the primary assignee
    pub assignee_ids: Vec<String>,
    /// `YYYY-MM-DD`
    pub last_activity_date: String,
    pub case_description: Option<String>,
    pub contact: Contact,
    pub details: Details,
    pub immigration_case: ImmigrationCase,
    pub questionnaire: Option<Questionnaire>,
    pub payment_plan: Option<PaymentPlan>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Manager,
}

/// An operator who can be assigned to cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar_url: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub role: UserRole,
}

/// An immigration office a case is filed with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Office {
    pub id: String,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    #[default]
    Standard,
    Custom,
}

/// A stored document template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateReference {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Location of the template binary inside the blob store
    pub storage_path: String,
    pub category: TemplateCategory,
    pub usage_count: u64,
    pub uploaded_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// An entry of a case's audit trail. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub case_id: String,
    pub date: DateTime<Utc>,
    pub content: String,
    /// Blob locations of documents attached to this entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_locations: Vec<String>,
}

impl AuditEntry {
    /// Create an entry stamped with the current time.
    pub fn new(case_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            case_id: case_id.into(),
            date: Utc::now(),
            content: content.into(),
            file_locations: Vec::new(),
        }
    }

    /// Attach blob locations of archived documents.
    #[must_use]
    pub fn with_files(mut self, file_locations: Vec<String>) -> Self {
        self.file_locations = file_locations;
        self
    }
}
