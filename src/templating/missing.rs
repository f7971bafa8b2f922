//! Missing-field detection.
//!
//! Cross-references the tags a template uses with the [tag map](super::tag_map)
//! and the built context, and reports the checkable tags whose value is empty.
//! The result drives the single confirmation step where an operator supplies
//! the missing values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::path::{get, is_empty_value};
use super::tag_map;

/// A tag whose value has to be supplied by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    /// The tag, which is also its context path
    pub path: String,
    /// Label from the tag map
    pub label: String,
    /// Operator input; empty until filled in
    pub value: String,
}

/// Report the mapped tags whose context value is empty.
///
/// Tags without a tag map entry are skipped; they are expected to resolve
/// inside loop bodies or from context keys outside the mapped set. A value is
/// empty when it is absent, `null`, `""`, `0` or `false`, so a legitimate zero
/// is reported as missing too.
///
/// The result follows the order of `tags`, one entry per tag.
pub fn detect<S: AsRef<str>>(tags: &[S], context: &Value) -> Vec<MissingField> {
    let mut missing: Vec<MissingField> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref();
        let Some(entry) = tag_map::lookup(tag) else {
            continue;
        };
        if missing.iter().any(|field| field.path == tag) {
            continue;
        }
        if is_empty_value(get(context, entry.context_path)) {
            tracing::debug!("Tag '{}' ({}) has no value", tag, entry.label);
            missing.push(MissingField {
                path: tag.to_string(),
                label: entry.label.to_string(),
                value: String::new(),
            });
        }
    }
    missing
}
