//! The table of checkable template tags.
//!
//! Each entry ties a template tag to where its value lives in two places: the
//! generation context built by [`super::context`], and the persistent case
//! record. Keeping both paths in one row means they cannot drift apart for a
//! given tag. Supporting a new tag is a single new row here.
//!
//! Numeric and boolean questionnaire fields are intentionally absent: the
//! missing-field check treats `0` and `false` as empty, so they would always
//! be flagged.

/// One row of the tag table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMapEntry {
    /// Tag as written in the template (`{client.email}`)
    pub tag: &'static str,
    /// Location of the value inside the generation context
    pub context_path: &'static str,
    /// Location of the value inside the case record
    pub record_path: &'static str,
    /// Human readable field name shown to operators
    pub label: &'static str,
}

const fn entry(
    tag: &'static str,
    record_path: &'static str,
    label: &'static str,
) -> TagMapEntry {
    // Tags are defined to equal their context path.
    TagMapEntry {
        tag,
        context_path: tag,
        record_path,
        label,
    }
}

/// Every tag the generator can check against a case record.
pub static TAG_MAP: &[TagMapEntry] = &[
    entry("client.name", "name", "Full Name"),
    entry("client.email", "contact.email", "Email Address"),
    entry("client.phone", "contact.phone", "Phone Number"),
    entry("client.nationality", "details.nationality", "Nationality"),
    entry("client.passport_number", "details.passport_number", "Passport Number"),
    entry("client.case_description", "case_description", "Case Summary"),
    entry("case.case_number", "immigration_case.case_number", "Case Number"),
    entry("case.case_password", "immigration_case.case_password", "Password to Case"),
    entry(
        "questionnaire.personal_data.surname",
        "questionnaire.personal_data.surname",
        "Surname (Questionnaire)",
    ),
    entry(
        "questionnaire.personal_data.name",
        "questionnaire.personal_data.name",
        "First Name(s) (Questionnaire)",
    ),
    entry(
        "questionnaire.personal_data.family_name",
        "questionnaire.personal_data.family_name",
        "Family Name (Questionnaire)",
    ),
    entry(
        "questionnaire.personal_data.date_of_birth",
        "questionnaire.personal_data.date_of_birth",
        "Date of Birth (Questionnaire)",
    ),
    entry(
        "questionnaire.personal_data.place_of_birth",
        "questionnaire.personal_data.place_of_birth",
        "Place of Birth (Questionnaire)",
    ),
    entry(
        "questionnaire.personal_data.country_of_birth",
        "questionnaire.personal_data.country_of_birth",
        "Country of Birth (Questionnaire)",
    ),
    entry(
        "questionnaire.personal_data.pesel",
        "questionnaire.personal_data.pesel",
        "PESEL Number (Questionnaire)",
    ),
    entry(
        "questionnaire.place_of_residence_in_poland",
        "questionnaire.place_of_residence_in_poland",
        "Place of Residence in Poland",
    ),
    entry(
        "questionnaire.last_entry_date_to_poland",
        "questionnaire.last_entry_date_to_poland",
        "Date of Last Entry to Poland",
    ),
];

/// Find the row for `tag`, if the tag is checkable.
pub fn lookup(tag: &str) -> Option<&'static TagMapEntry> {
    TAG_MAP.iter().find(|entry| entry.tag == tag)
}

/// All rows, in table order, for display as a tag reference.
pub fn reference() -> &'static [TagMapEntry] {
    TAG_MAP
}
