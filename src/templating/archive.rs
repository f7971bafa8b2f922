//! DOCX template archive access.
//!
//! A `.docx` file is a zip archive. Only a handful of its XML parts carry
//! document text (the body, headers, footers, foot- and endnotes); everything
//! else is copied through untouched when a rendered document is written back.
//!
//! Inside a text part the visible text lives in `<w:t>` runs. Word processors
//! freely split a single tag such as `{client.name}` across several runs
//! (spell checking, formatting changes), so tag scanning always works on the
//! concatenated run text, and [`normalize_tag_runs`] rewrites a part so that
//! every tag sits inside exactly one run before rendering.
//!
//! Parts are walked with `quick_xml`. Braces elsewhere in the markup, such as
//! the GUIDs of drawing extensions or field instructions, are not text and
//! never produce tags.

use std::io::{Cursor, Read, Write};
use std::ops::Range;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::syntax::{self, TagKind};
use crate::core::DocgenError;

/// Main document body part.
pub const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Clone)]
struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// An in-memory template archive.
#[derive(Debug, Clone)]
pub struct TemplateArchive {
    entries: Vec<ArchiveEntry>,
}

/// Whether an archive entry holds document text that may contain tags.
pub fn is_text_part(name: &str) -> bool {
    let Some(stem) = name.strip_prefix("word/").and_then(|n| n.strip_suffix(".xml")) else {
        return false;
    };
    if stem.contains('/') {
        return false;
    }

    let numbered = |prefix: &str| {
        stem.strip_prefix(prefix).is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
    };
    stem == "document"
        || stem == "footnotes"
        || stem == "endnotes"
        || numbered("header")
        || numbered("footer")
}

impl TemplateArchive {
    /// Read an archive from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocgenError::MalformedTemplate`] if the bytes are not a zip
    /// archive, an entry cannot be decompressed, or the archive has no text
    /// parts at all.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocgenError> {
        let malformed = |reason: String| DocgenError::MalformedTemplate {
            reason,
        };

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| malformed(format!("not a valid document archive: {e}")))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| malformed(format!("unreadable archive entry #{i}: {e}")))?;
            let name = file.name().to_string();
            let mut data = Vec::new();
            if file.is_file() {
                file.read_to_end(&mut data)
                    .map_err(|e| malformed(format!("failed to decompress '{name}': {e}")))?;
            }
            entries.push(ArchiveEntry {
                compression: file.compression(),
                is_dir: file.is_dir(),
                name,
                data,
            });
        }

        let result = Self {
            entries,
        };
        if result.text_part_names().next().is_none() {
            return Err(malformed("archive contains no document text parts".to_string()));
        }
        tracing::debug!(
            "Loaded template archive with {} entries ({} text parts)",
            result.entries.len(),
            result.text_part_names().count()
        );
        Ok(result)
    }

    /// Names of the parts that carry document text, in archive order.
    pub fn text_part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|e| !e.is_dir && is_text_part(&e.name)).map(|e| e.name.as_str())
    }

    /// Decoded XML of a text part.
    ///
    /// # Errors
    ///
    /// Returns [`DocgenError::MalformedTemplate`] if the part is missing or not UTF-8.
    pub fn part_xml(&self, name: &str) -> Result<&str, DocgenError> {
        let entry = self.entries.iter().find(|e| e.name == name).ok_or_else(|| {
            DocgenError::MalformedTemplate {
                reason: format!("archive has no part named '{name}'"),
            }
        })?;
        std::str::from_utf8(&entry.data).map_err(|e| DocgenError::MalformedTemplate {
            reason: format!("part '{name}' is not valid UTF-8: {e}"),
        })
    }

    /// Replace the contents of an existing part.
    pub fn replace_part(&mut self, name: &str, data: Vec<u8>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.data = data;
        }
    }

    /// Serialize the archive, keeping each entry's compression method.
    pub fn to_bytes(&self) -> zip::result::ZipResult<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            let options = SimpleFileOptions::default().compression_method(entry.compression);
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
            } else {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}

/// Byte ranges of one `<w:t>` run inside a part.
#[derive(Debug, Clone)]
pub(crate) struct TextRun {
    /// The opening `<w:t ...>` element
    pub open: Range<usize>,
    /// The run's text between the opening and closing element
    pub content: Range<usize>,
}

/// Where text and paragraphs sit inside a part.
#[derive(Debug, Clone, Default)]
pub(crate) struct PartLayout {
    /// Text runs in document order
    pub runs: Vec<TextRun>,
    /// Whole `<w:p>` elements, opening tag to closing tag inclusive
    pub paragraphs: Vec<Range<usize>>,
}

impl PartLayout {
    /// Innermost paragraph containing `range`.
    fn paragraph_of(&self, range: &Range<usize>) -> Option<&Range<usize>> {
        self.paragraphs
            .iter()
            .filter(|p| p.start <= range.start && range.end <= p.end)
            .max_by_key(|p| p.start)
    }

    /// Concatenated run text inside `span`.
    fn text_within(&self, xml: &str, span: &Range<usize>) -> String {
        self.runs
            .iter()
            .filter(|run| span.start <= run.content.start && run.content.end <= span.end)
            .map(|run| &xml[run.content.clone()])
            .collect()
    }
}

/// Start of the markup element that ends right before `end`.
///
/// Element markup never contains a raw `<`, so the last one before the
/// reader's position opens the element just read.
fn element_start(xml: &str, end: usize) -> usize {
    xml[..end].rfind('<').unwrap_or(0)
}

/// Walk a part with an XML reader and record its runs and paragraphs.
///
/// Only the content of `<w:t>` elements counts as document text. Attribute
/// values, field instructions and drawing markup are never scanned, however
/// much they look like tags.
///
/// # Errors
///
/// Returns [`DocgenError::MalformedTemplate`] if the part is not well-formed XML.
pub(crate) fn scan_part(xml: &str) -> Result<PartLayout, DocgenError> {
    let mut reader = Reader::from_str(xml);
    let mut layout = PartLayout::default();
    let mut open_run: Option<Range<usize>> = None;
    let mut open_paragraphs: Vec<usize> = Vec::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(DocgenError::MalformedTemplate {
                    reason: format!("invalid XML near byte {}: {e}", reader.buffer_position()),
                });
            }
        };
        let end = reader.buffer_position();

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" => open_run = Some(element_start(xml, end)..end),
                b"w:p" => open_paragraphs.push(element_start(xml, end)),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => {
                    if let Some(open) = open_run.take() {
                        let content = open.end..element_start(xml, end);
                        layout.runs.push(TextRun {
                            open,
                            content,
                        });
                    }
                }
                b"w:p" => {
                    if let Some(start) = open_paragraphs.pop() {
                        layout.paragraphs.push(start..end);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            // <w:t/> and <w:p/> hold no text
            _ => {}
        }
    }

    Ok(layout)
}

/// Concatenated text of all runs of a part.
///
/// # Errors
///
/// Returns [`DocgenError::MalformedTemplate`] if the part is not well-formed XML.
pub(crate) fn run_text(xml: &str) -> Result<String, DocgenError> {
    let layout = scan_part(xml)?;
    Ok(layout.runs.iter().map(|run| &xml[run.content.clone()]).collect())
}

/// Rewrite a part so that no tag spans more than one text run.
///
/// Every character of a tag is moved into the run where the tag starts; the
/// remainder of later runs keeps its position. Runs receiving moved text are
/// marked `xml:space="preserve"` so surrounding spaces survive.
///
/// # Errors
///
/// Returns [`DocgenError::MalformedTemplate`] if the part is not well-formed XML.
pub(crate) fn normalize_tag_runs(xml: &str) -> Result<String, DocgenError> {
    let runs = scan_part(xml)?.runs;
    if runs.is_empty() {
        return Ok(xml.to_string());
    }

    let mut concat = String::new();
    let mut owner: Vec<usize> = Vec::new();
    for (index, run) in runs.iter().enumerate() {
        concat.push_str(&xml[run.content.clone()]);
        owner.resize(concat.len(), index);
    }

    let mut changed = vec![false; runs.len()];
    for token in syntax::scan(&concat) {
        let start_owner = owner[token.range.start];
        if owner[token.range.end - 1] == start_owner {
            continue;
        }
        for byte in token.range.clone() {
            if owner[byte] != start_owner {
                changed[owner[byte]] = true;
                owner[byte] = start_owner;
            }
        }
        changed[start_owner] = true;
    }

    if !changed.iter().any(|c| *c) {
        return Ok(xml.to_string());
    }

    let mut texts = vec![String::new(); runs.len()];
    let mut segment_start = 0;
    for pos in 1..=concat.len() {
        if pos == concat.len() || owner[pos] != owner[segment_start] {
            texts[owner[segment_start]].push_str(&concat[segment_start..pos]);
            segment_start = pos;
        }
    }

    let mut out = String::with_capacity(xml.len());
    let mut last = 0;
    for (index, run) in runs.iter().enumerate() {
        out.push_str(&xml[last..run.open.start]);
        let open = &xml[run.open.clone()];
        if changed[index] && !open.contains("xml:space") {
            // "<w:t" is four bytes; keep any other attributes as written
            out.push_str(r#"<w:t xml:space="preserve""#);
            out.push_str(&open[4..]);
        } else {
            out.push_str(open);
        }
        out.push_str(&texts[index]);
        last = run.content.end;
    }
    out.push_str(&xml[last..]);
    Ok(out)
}

/// Tags of a normalized part, with ranges pointing into the part's XML.
///
/// Tags are looked up run by run, so [`normalize_tag_runs`] must have been
/// applied first. When a block's opening and closing tags each fill a
/// paragraph on their own, both ranges are widened to cover those
/// paragraphs: the block then repeats whole paragraphs and the tag
/// paragraphs themselves disappear from the output.
pub(crate) fn template_tags<'x>(xml: &'x str, layout: &PartLayout) -> Vec<syntax::TagToken<'x>> {
    let mut tokens: Vec<syntax::TagToken<'x>> = layout
        .runs
        .iter()
        .flat_map(|run| {
            let offset = run.content.start;
            syntax::scan(&xml[run.content.clone()]).into_iter().map(move |token| {
                syntax::TagToken {
                    range: token.range.start + offset..token.range.end + offset,
                    ..token
                }
            })
        })
        .collect();

    let mut opened: Vec<usize> = Vec::new();
    for index in 0..tokens.len() {
        match tokens[index].kind {
            TagKind::Open | TagKind::InvertedOpen => opened.push(index),
            TagKind::Close => {
                let Some(open) = opened.pop() else {
                    continue;
                };
                if tokens[open].name != tokens[index].name {
                    continue;
                }
                let open_paragraph = sole_paragraph(xml, layout, &tokens[open]);
                let close_paragraph = sole_paragraph(xml, layout, &tokens[index]);
                if let (Some(first), Some(last)) = (open_paragraph, close_paragraph) {
                    tracing::trace!("Block '{}' spans whole paragraphs", tokens[index].name);
                    tokens[open].range = first;
                    tokens[index].range = last;
                }
            }
            TagKind::Scalar => {}
        }
    }
    tokens
}

/// The paragraph `token` is the only text of, if any.
fn sole_paragraph(
    xml: &str,
    layout: &PartLayout,
    token: &syntax::TagToken<'_>,
) -> Option<Range<usize>> {
    let paragraph = layout.paragraph_of(&token.range)?;
    let text = layout.text_within(xml, paragraph);
    (text.trim() == &xml[token.range.clone()]).then(|| paragraph.clone())
}
