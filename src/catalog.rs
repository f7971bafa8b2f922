//! Template catalog helpers.
//!
//! Ordering and filtering of template references for display, and naming of
//! generated files.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{TemplateCategory, TemplateReference};

/// Sort templates by usage (most used first), then by name, and keep those
/// whose name or description contains `search`, ignoring case.
///
/// An empty or blank `search` keeps everything.
pub fn sort_and_filter(
    templates: &[TemplateReference],
    search: Option<&str>,
) -> Vec<TemplateReference> {
    let mut sorted = templates.to_vec();
    sorted.sort_by(|a, b| {
        b.usage_count.cmp(&a.usage_count).then_with(|| compare_names(&a.name, &b.name))
    });

    let Some(needle) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return sorted;
    };
    let needle = needle.to_lowercase();
    sorted
        .into_iter()
        .filter(|t| {
            t.name.to_lowercase().contains(&needle) || t.description.to_lowercase().contains(&needle)
        })
        .collect()
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Split templates into `(standard, custom)`, keeping their order.
pub fn partition_by_category(
    templates: Vec<TemplateReference>,
) -> (Vec<TemplateReference>, Vec<TemplateReference>) {
    templates.into_iter().partition(|t| t.category == TemplateCategory::Standard)
}

fn punctuation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"))
}

fn file_name_part(text: &str) -> String {
    punctuation()
        .replace_all(text, "")
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// File name of a generated document: `<template>_<client>.docx`, with
/// punctuation removed and whitespace replaced by underscores.
///
/// ```
/// use casedoc::catalog::output_file_name;
///
/// assert_eq!(
///     output_file_name("Power of Attorney (v2)", "Jan Kowalski"),
///     "Power_of_Attorney_v2_Jan_Kowalski.docx"
/// );
/// ```
pub fn output_file_name(template_name: &str, client_name: &str) -> String {
    format!("{}_{}.docx", file_name_part(template_name), file_name_part(client_name))
}
