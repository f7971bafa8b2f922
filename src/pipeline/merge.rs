//! Merging operator input into a run.
//!
//! Every supplied value lands in the generation context at the tag's own path.
//! When the operator asked to save, values of mapped tags are also staged into
//! a copy of the case record at the tag's record path, and a change note is
//! collected for the audit log. Writes overwrite, so merging the same values
//! twice gives the same result.

use serde_json::Value;

use crate::core::DocgenError;
use crate::models::CaseRecord;
use crate::templating::path::set;
use crate::templating::tag_map;

/// Heading of the audit entry written when a record is updated.
pub const PROFILE_UPDATE_HEADING: &str = "Client profile updated during document generation:";

/// Case record changes staged by a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedUpdate {
    /// The record with every mapped value applied, still untyped
    pub record: Value,
    /// One note per changed field, e.g. `"Email Address" was updated.`
    pub notes: Vec<String>,
}

impl StagedUpdate {
    /// Convert the staged record back into a typed case record.
    ///
    /// # Errors
    ///
    /// Returns [`DocgenError::PersistFailure`] if a value does not fit the
    /// field it was written to.
    pub fn into_record(self, case_id: &str) -> Result<CaseRecord, DocgenError> {
        serde_json::from_value(self.record).map_err(|e| DocgenError::PersistFailure {
            case_id: case_id.to_string(),
            reason: format!("corrected values do not fit the case record: {e}"),
        })
    }

    /// Audit log text summarizing every change.
    pub fn audit_text(&self) -> String {
        let mut text = PROFILE_UPDATE_HEADING.to_string();
        for note in &self.notes {
            text.push('\n');
            text.push_str("- ");
            text.push_str(note);
        }
        text
    }
}

/// Merge `(tag, value)` pairs into `context`.
///
/// Returns the staged record update when `persist` is set and at least one
/// tag has a record path; unmapped tags only ever reach the context.
pub fn merge_values(
    context: &mut Value,
    record: &CaseRecord,
    values: &[(String, String)],
    persist: bool,
) -> Result<Option<StagedUpdate>, DocgenError> {
    let mut staged: Option<StagedUpdate> = None;

    for (tag, value) in values {
        set(context, tag, Value::String(value.clone()));

        if !persist {
            continue;
        }
        let Some(entry) = tag_map::lookup(tag) else {
            tracing::debug!("Tag '{}' has no record path; merged into context only", tag);
            continue;
        };

        let update = match staged.as_mut() {
            Some(update) => update,
            None => staged.insert(StagedUpdate {
                record: serde_json::to_value(record).map_err(|e| DocgenError::PersistFailure {
                    case_id: record.id.clone(),
                    reason: format!("failed to stage record update: {e}"),
                })?,
                notes: Vec::new(),
            }),
        };
        set(&mut update.record, entry.record_path, Value::String(value.clone()));

        let note = format!("\"{}\" was updated.", entry.label);
        if !update.notes.contains(&note) {
            update.notes.push(note);
        }
    }

    Ok(staged)
}
