//! Template rendering.
//!
//! [`TemplateRenderer`] is the seam between the generation pipeline and the
//! engine that merges a context into a template binary. [`DocxRenderer`] is
//! the built-in engine for `.docx` templates.
//!
//! # Resolution rules
//!
//! A tag name is a dotted path resolved against a stack of scopes. The root
//! context is the outermost scope; every loop iteration and every object-valued
//! section pushes one more. Lookup starts at the innermost scope and uses the
//! first scope that has the name's first segment as a key.
//!
//! - If no scope knows the first segment, rendering fails with a mismatch
//!   naming the tag.
//! - A `null` value renders as empty text, and so does any path below a
//!   `null` (`{questionnaire.personal_data.pesel}` without a questionnaire).
//! - A key missing from an object that does exist is a mismatch as well:
//!   `{client.emial}` fails instead of printing nothing.
//!
//! Only text inside `<w:t>` runs is searched for tags. A block whose opening
//! and closing tags each sit alone in a paragraph repeats whole paragraphs.
//!
//! # Sections
//!
//! | Value | `{#name}` | `{^name}` |
//! |-------|-----------|-----------|
//! | non-empty list | body once per item, item as scope | skipped |
//! | empty list | skipped | body once |
//! | object | body once, object as scope | skipped |
//! | other truthy value | body once | skipped |
//! | falsy value or `null` | skipped | body once |

use serde_json::Value;
use strsim::levenshtein;

use super::archive::{TemplateArchive, normalize_tag_runs, scan_part, template_tags};
use super::error::RenderError;
use super::path::is_empty_value;
use super::syntax::{self, Node};

/// Maximum Levenshtein distance for suggestions, as a percentage of the tag length.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Maximum number of suggestions attached to a mismatch.
const MAX_SUGGESTIONS: usize = 3;

/// Merges a data context into a template binary.
///
/// Implementations must not perform I/O; the pipeline handles fetching and
/// storing binaries.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` against `context`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the template references data that is not
    /// in the context, or when its block structure is invalid.
    fn render(&self, template: &[u8], context: &Value) -> Result<Vec<u8>, RenderError>;
}

/// Renderer for `.docx` templates.
#[derive(Debug, Clone, Copy)]
pub struct DocxRenderer {
    linebreaks: bool,
}

impl Default for DocxRenderer {
    fn default() -> Self {
        Self {
            linebreaks: true,
        }
    }
}

impl DocxRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `\n` in a value becomes a line break in the document.
    #[must_use]
    pub fn with_linebreaks(mut self, linebreaks: bool) -> Self {
        self.linebreaks = linebreaks;
        self
    }

    /// Render one text part.
    fn render_part(&self, xml: &str, context: &Value) -> Result<String, RenderError> {
        let normalized =
            normalize_tag_runs(xml).map_err(|e| RenderError::new(None, e.to_string()))?;
        let layout = scan_part(&normalized).map_err(|e| RenderError::new(None, e.to_string()))?;
        let nodes = syntax::parse(&normalized, template_tags(&normalized, &layout))?;
        let mut out = String::with_capacity(normalized.len());
        let mut scopes = vec![context];
        self.render_nodes(&nodes, &mut scopes, &mut out)?;
        Ok(out)
    }

    fn render_nodes<'v>(
        &self,
        nodes: &[Node<'_>],
        scopes: &mut Vec<&'v Value>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Value(name) => match resolve(scopes, name) {
                    Resolved::Unknown => return Err(unknown_tag(name, scopes)),
                    Resolved::Empty => {}
                    Resolved::Found(value) => self.push_value(name, value, out)?,
                },
                Node::Section {
                    name,
                    inverted,
                    children,
                } => {
                    let value = match resolve(scopes, name) {
                        Resolved::Unknown => return Err(unknown_tag(name, scopes)),
                        Resolved::Empty => None,
                        Resolved::Found(value) => Some(value),
                    };
                    self.render_section(value, *inverted, children, scopes, out)?;
                }
            }
        }
        Ok(())
    }

    fn render_section<'v>(
        &self,
        value: Option<&'v Value>,
        inverted: bool,
        children: &[Node<'_>],
        scopes: &mut Vec<&'v Value>,
        out: &mut String,
    ) -> Result<(), RenderError> {
        match value {
            Some(Value::Array(items)) if inverted => {
                if items.is_empty() {
                    self.render_nodes(children, scopes, out)?;
                }
            }
            Some(Value::Array(items)) => {
                for item in items {
                    scopes.push(item);
                    let result = self.render_nodes(children, scopes, out);
                    scopes.pop();
                    result?;
                }
            }
            _ if inverted => {
                if is_empty_value(value) {
                    self.render_nodes(children, scopes, out)?;
                }
            }
            Some(object) if object.is_object() => {
                scopes.push(object);
                let result = self.render_nodes(children, scopes, out);
                scopes.pop();
                result?;
            }
            _ => {
                if !is_empty_value(value) {
                    self.render_nodes(children, scopes, out)?;
                }
            }
        }
        Ok(())
    }

    fn push_value(&self, name: &str, value: &Value, out: &mut String) -> Result<(), RenderError> {
        let text = match value {
            Value::Null => return Ok(()),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(RenderError::new(
                    Some(name),
                    format!(
                        "The tag '{name}' holds a list or group and cannot be printed as text; \
                         use it as a block with {{#{name}}}...{{/{name}}}"
                    ),
                ));
            }
        };

        let escaped = escape_xml(&text);
        if self.linebreaks && escaped.contains('\n') {
            let escaped = escaped.replace("\r\n", "\n");
            out.push_str(&escaped.replace('\n', r#"</w:t><w:br/><w:t xml:space="preserve">"#));
        } else {
            out.push_str(&escaped);
        }
        Ok(())
    }
}

impl TemplateRenderer for DocxRenderer {
    fn render(&self, template: &[u8], context: &Value) -> Result<Vec<u8>, RenderError> {
        let mut archive = TemplateArchive::from_bytes(template)
            .map_err(|e| RenderError::new(None, e.to_string()))?;

        let parts: Vec<String> = archive.text_part_names().map(str::to_string).collect();
        for part in &parts {
            let xml = archive.part_xml(part).map_err(|e| RenderError::new(None, e.to_string()))?;
            let rendered = self.render_part(xml, context)?;
            archive.replace_part(part, rendered.into_bytes());
            tracing::debug!("Rendered part '{}'", part);
        }

        archive
            .to_bytes()
            .map_err(|e| RenderError::new(None, format!("failed to write rendered document: {e}")))
    }
}

enum Resolved<'v> {
    Found(&'v Value),
    /// The value, or an object on the way to it, is `null`
    Empty,
    /// No scope has the root segment, or a key is missing from an object
    Unknown,
}

fn resolve<'v>(scopes: &[&'v Value], name: &str) -> Resolved<'v> {
    let mut segments = name.split('.');
    let root = segments.next().unwrap_or(name);
    let Some(mut current) = scopes.iter().rev().find_map(|&scope| scope.get(root)) else {
        return Resolved::Unknown;
    };

    for segment in segments {
        current = match current {
            Value::Null => return Resolved::Empty,
            Value::Object(map) => match map.get(segment) {
                Some(value) => value,
                None => return Resolved::Unknown,
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(value) => value,
                None => return Resolved::Unknown,
            },
            _ => return Resolved::Unknown,
        };
    }

    match current {
        Value::Null => Resolved::Empty,
        value => Resolved::Found(value),
    }
}

fn unknown_tag(name: &str, scopes: &[&Value]) -> RenderError {
    let mut available = Vec::new();
    for scope in scopes {
        collect_paths(scope, String::new(), 0, &mut available);
    }
    available.sort();
    available.dedup();

    RenderError::new(Some(name), format!("The tag '{name}' does not exist in the data"))
        .with_suggestions(find_similar(name, &available))
}

/// Dotted paths of a value, down to three levels.
fn collect_paths(value: &Value, prefix: String, depth: usize, out: &mut Vec<String>) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if depth < 2 {
            collect_paths(child, path.clone(), depth + 1, out);
        }
        out.push(path);
    }
}

fn find_similar(target: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<_> =
        available.iter().map(|candidate| (candidate, levenshtein(target, candidate))).collect();
    scored.sort_by_key(|(_, distance)| *distance);

    scored
        .into_iter()
        .filter(|(_, distance)| *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(MAX_SUGGESTIONS)
        .map(|(candidate, _)| candidate.clone())
        .collect()
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::DocxFixture;
    use serde_json::json;

    fn render_text(template: &[u8], context: &Value) -> Result<String, RenderError> {
        let output = DocxRenderer::new().render(template, context)?;
        Ok(DocxFixture::document_text(&output))
    }

    #[test]
    fn test_render_scalars() {
        let template = DocxFixture::new().paragraph("Dear {client.name}, case {{case.case_number}}").build();
        let context = json!({ "client": { "name": "Jan Kowalski" }, "case": { "case_number": 42 } });
        assert_eq!(render_text(&template, &context).unwrap(), "Dear Jan Kowalski, case 42");
    }

    #[test]
    fn test_render_split_runs() {
        let template = DocxFixture::new().split_runs(&["Hello {cli", "ent.na", "me}!"]).build();
        let context = json!({ "client": { "name": "Ola" } });
        assert_eq!(render_text(&template, &context).unwrap(), "Hello Ola!");
    }

    #[test]
    fn test_render_unknown_root_is_mismatch_with_suggestions() {
        let template = DocxFixture::new().paragraph("{clent.name}").build();
        let context = json!({ "client": { "name": "Ola" } });
        let err = render_text(&template, &context).unwrap_err();
        assert_eq!(err.tag.as_deref(), Some("clent.name"));
        assert!(err.explanation.as_deref().unwrap_or_default().contains("does not exist"));
        assert!(err.suggestions.contains(&"client.name".to_string()));
    }

    #[test]
    fn test_render_null_values_are_empty() {
        let template = DocxFixture::new()
            .paragraph("[{client.email}][{questionnaire.personal_data.pesel}]")
            .build();
        let context = json!({ "client": { "email": null }, "questionnaire": null });
        assert_eq!(render_text(&template, &context).unwrap(), "[][]");
    }

    #[test]
    fn test_render_missing_key_in_object_is_mismatch() {
        let template = DocxFixture::new().paragraph("Email: {client.emial}").build();
        let context = json!({ "client": { "email": "jan@example.com" } });
        let err = render_text(&template, &context).unwrap_err();
        assert_eq!(err.tag.as_deref(), Some("client.emial"));
        assert!(err.suggestions.contains(&"client.email".to_string()));
    }

    #[test]
    fn test_render_missing_block_key_is_mismatch() {
        let template = DocxFixture::new().paragraph("{#client.phnoe}x{/client.phnoe}").build();
        let err = render_text(&template, &json!({ "client": { "phone": null } })).unwrap_err();
        assert_eq!(err.tag.as_deref(), Some("client.phnoe"));
    }

    #[test]
    fn test_render_loop_over_list() {
        let template = DocxFixture::new().paragraph("{#assignees}[{name}]{/assignees}").build();
        let context = json!({ "assignees": [{ "name": "A" }, { "name": "B" }] });
        assert_eq!(render_text(&template, &context).unwrap(), "[A][B]");
    }

    #[test]
    fn test_render_loop_falls_back_to_outer_scope() {
        let template = DocxFixture::new().paragraph("{#assignees}{name}@{case.office_name} {/assignees}").build();
        let context = json!({
            "assignees": [{ "name": "A" }],
            "case": { "office_name": "Kraków" }
        });
        assert_eq!(render_text(&template, &context).unwrap(), "A@Kraków ");
    }

    #[test]
    fn test_render_conditions() {
        let template = DocxFixture::new()
            .paragraph("{#client.phone}phone{/client.phone}{^client.email}no email{/client.email}")
            .build();
        let context = json!({ "client": { "phone": "123", "email": "" } });
        assert_eq!(render_text(&template, &context).unwrap(), "phoneno email");
    }

    #[test]
    fn test_render_inverted_empty_list() {
        let template = DocxFixture::new().paragraph("{#assignees}x{/assignees}{^assignees}nobody{/assignees}").build();
        let context = json!({ "assignees": [] });
        assert_eq!(render_text(&template, &context).unwrap(), "nobody");
    }

    #[test]
    fn test_render_object_section_changes_scope() {
        let template = DocxFixture::new().paragraph("{#primary_assignee}{name}{/primary_assignee}").build();
        let context = json!({ "primary_assignee": { "name": "Anna" } });
        assert_eq!(render_text(&template, &context).unwrap(), "Anna");
    }

    #[test]
    fn test_render_escapes_xml() {
        let template = DocxFixture::new().paragraph("{client.name}").build();
        let context = json!({ "client": { "name": "Smith & <Sons>" } });
        let output = DocxRenderer::new().render(&template, &context).unwrap();
        let xml = DocxFixture::part(&output, "word/document.xml");
        assert!(xml.contains("Smith &amp; &lt;Sons&gt;"));
    }

    #[test]
    fn test_render_linebreaks() {
        let template = DocxFixture::new().paragraph("{client.case_description}").build();
        let context = json!({ "client": { "case_description": "one\ntwo" } });

        let output = DocxRenderer::new().render(&template, &context).unwrap();
        assert!(DocxFixture::part(&output, "word/document.xml").contains("one</w:t><w:br/>"));

        let output = DocxRenderer::new().with_linebreaks(false).render(&template, &context).unwrap();
        assert!(!DocxFixture::part(&output, "word/document.xml").contains("<w:br/>"));
    }

    #[test]
    fn test_render_headers_and_footers() {
        let template = DocxFixture::new()
            .header("{case.office_name}")
            .paragraph("body")
            .footer("{date.today}")
            .build();
        let context = json!({ "case": { "office_name": "HQ" }, "date": { "today": "01.02.2024" } });
        let output = DocxRenderer::new().render(&template, &context).unwrap();
        assert!(DocxFixture::part(&output, "word/header1.xml").contains("HQ"));
        assert!(DocxFixture::part(&output, "word/footer1.xml").contains("01.02.2024"));
    }

    #[test]
    fn test_render_rejects_object_as_scalar() {
        let template = DocxFixture::new().paragraph("{client}").build();
        let err = render_text(&template, &json!({ "client": { "name": "x" } })).unwrap_err();
        assert_eq!(err.tag.as_deref(), Some("client"));
    }

    #[test]
    fn test_render_reports_unclosed_loop() {
        let template = DocxFixture::new().paragraph("{#assignees}{name}").build();
        let err = render_text(&template, &json!({ "assignees": [] })).unwrap_err();
        assert_eq!(err.tag.as_deref(), Some("assignees"));
    }

    #[test]
    fn test_render_ignores_braces_in_markup() {
        let document = format!(
            r#"<w:document xmlns:w="{ns}" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><w:body><w:p><w:r><w:drawing><a:graphic><a:extLst><a:ext uri="{{FF2B5EF4-FFF2-40B4-BE49-F238E27FC236}}"/></a:extLst></a:graphic></w:drawing></w:r><w:fldSimple w:instr=" MERGEFIELD {{legacy_id}} "><w:r><w:t>1</w:t></w:r></w:fldSimple><w:r><w:t xml:space="preserve"> {{client.name}}</w:t></w:r></w:p></w:body></w:document>"#,
            ns = "http://schemas.openxmlformats.org/wordprocessingml/2006/main"
        );
        let template = DocxFixture::raw(&[("word/document.xml", &document)]);
        let context = json!({ "client": { "name": "Ola" } });

        let output = DocxRenderer::new().render(&template, &context).unwrap();
        let xml = DocxFixture::part(&output, "word/document.xml");
        assert!(xml.contains(r#"uri="{FF2B5EF4-FFF2-40B4-BE49-F238E27FC236}""#));
        assert!(xml.contains(r#"w:instr=" MERGEFIELD {legacy_id} ""#));
        assert_eq!(DocxFixture::document_text(&output), "1 Ola");
    }

    #[test]
    fn test_render_paragraph_loop() {
        let template = DocxFixture::new()
            .paragraph("Team:")
            .paragraph("{#assignees}")
            .paragraph("- {name}")
            .paragraph("{/assignees}")
            .build();
        let context = json!({ "assignees": [{ "name": "A" }, { "name": "B" }] });

        let output = DocxRenderer::new().render(&template, &context).unwrap();
        let xml = DocxFixture::part(&output, "word/document.xml");
        assert_eq!(xml.matches("<w:p>").count(), 3);
        assert_eq!(DocxFixture::document_text(&output), "Team:- A- B");
    }

    #[test]
    fn test_render_paragraph_loop_over_empty_list() {
        let template = DocxFixture::new()
            .paragraph("{#assignees}")
            .paragraph("{name}")
            .paragraph("{/assignees}")
            .paragraph("end")
            .build();
        let output = DocxRenderer::new().render(&template, &json!({ "assignees": [] })).unwrap();
        let xml = DocxFixture::part(&output, "word/document.xml");
        assert_eq!(xml.matches("<w:p>").count(), 1);
        assert_eq!(DocxFixture::document_text(&output), "end");
    }

    #[test]
    fn test_render_inline_block_keeps_tag_paragraphs() {
        let template = DocxFixture::new().paragraph("{#assignees}").paragraph("{name}{/assignees}").build();
        let context = json!({ "assignees": [{ "name": "A" }, { "name": "B" }] });

        let output = DocxRenderer::new().render(&template, &context).unwrap();
        let xml = DocxFixture::part(&output, "word/document.xml");
        assert_eq!(xml.matches("<w:p>").count(), 3);
        assert_eq!(DocxFixture::document_text(&output), "AB");
    }

    #[test]
    fn test_render_word_shaped_document() {
        let template = DocxFixture::word_shaped();
        let context = json!({
            "client": { "name": "Jan Kowalski" },
            "case": { "case_number": "WSC-II-S.6151.12345.2024", "office_name": "MUW" },
            "assignees": [{ "name": "Anna Nowak" }, { "name": "Piotr Wiśniewski" }],
            "date": { "today": "19.10.2026" }
        });

        let output = DocxRenderer::new().render(&template, &context).unwrap();
        assert_eq!(
            DocxFixture::document_text(&output),
            "PełnomocnictwoMocodawca: Jan KowalskiStrona 1, sprawa WSC-II-S.6151.12345.2024\
             MUWAnna NowakPiotr WiśniewskiData: 19.10.2026"
        );

        let xml = DocxFixture::part(&output, "word/document.xml");
        assert!(xml.contains(r#"<a:ext uri="{FF2B5EF4-FFF2-40B4-BE49-F238E27FC236}">"#));
        assert!(xml.contains(r#"w:instr=" PAGE  \* MERGEFORMAT ""#));
        assert!(xml.contains(r#"<w:alias w:val="Urząd"/>"#));
        assert_eq!(xml.matches(r#"<w:pStyle w:val="ListBullet"/>"#).count(), 2);
        assert!(!xml.contains("assignees"));
    }

    #[test]
    fn test_render_keeps_non_text_parts() {
        let template = DocxFixture::new().paragraph("x").build();
        let output = DocxRenderer::new().render(&template, &json!({})).unwrap();
        assert!(DocxFixture::part(&output, "[Content_Types].xml").contains("Types"));
    }
}
