//! Tag discovery for DOCX templates.
//!
//! Reports every distinct name a template references: scalar tags, and the
//! names of loop and conditional blocks at any nesting depth. A block name is
//! reported even when it only wraps other tags, since its presence means the
//! context must provide that path.

use std::collections::HashSet;

use super::archive::{TemplateArchive, run_text};
use super::syntax;
use crate::core::DocgenError;

/// Extract the tags of a raw template binary.
///
/// Names are deduplicated and returned in order of first appearance, body
/// first, then headers, footers and notes in archive order.
///
/// # Errors
///
/// Returns [`DocgenError::MalformedTemplate`] when the binary is not a valid
/// archive, has no text parts, or a text part cannot be decoded or parsed. A partial
/// tag list is never returned.
///
/// # Examples
///
/// ```rust,no_run
/// # fn example(bytes: &[u8]) -> Result<(), casedoc::core::DocgenError> {
/// let tags = casedoc::templating::extractor::extract(bytes)?;
/// for tag in &tags {
///     println!("{{{tag}}}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract(template: &[u8]) -> Result<Vec<String>, DocgenError> {
    let archive = TemplateArchive::from_bytes(template)?;
    extract_from_archive(&archive)
}

/// Extract the tags of an already opened archive.
///
/// # Errors
///
/// Returns [`DocgenError::MalformedTemplate`] if a text part is not UTF-8 or
/// not well-formed XML.
pub fn extract_from_archive(archive: &TemplateArchive) -> Result<Vec<String>, DocgenError> {
    let mut part_names: Vec<&str> = archive.text_part_names().collect();
    // The body goes first so the operator sees its fields before header fields.
    part_names.sort_by_key(|name| *name != super::archive::DOCUMENT_PART);

    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for part in part_names {
        let text = run_text(archive.part_xml(part)?)?;
        let before = tags.len();
        for token in syntax::scan(&text) {
            if seen.insert(token.name.to_string()) {
                tags.push(token.name.to_string());
            }
        }
        tracing::debug!("Part '{}' contributed {} new tag(s)", part, tags.len() - before);
    }

    tracing::debug!("Extracted {} distinct tag(s) from template", tags.len());
    Ok(tags)
}
