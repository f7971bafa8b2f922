//! Tag grammar of DOCX templates.
//!
//! Tags are written with single or double braces and an optional sigil:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `{client.name}` / `{{client.name}}` | scalar substitution |
//! | `{#assignees}` … `{/assignees}` | loop over a list, or condition on a value |
//! | `{^questionnaire.has_liabilities}` … `{/…}` | inverted condition |
//!
//! Names are dotted paths. Whitespace inside the braces is ignored.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::error::RenderError;

/// What a tag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Scalar,
    /// `{#name}`
    Open,
    /// `{^name}`
    InvertedOpen,
    /// `{/name}`
    Close,
}

/// One tag occurrence in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken<'a> {
    pub kind: TagKind,
    pub name: &'a str,
    /// Byte range of the whole tag, braces included
    pub range: Range<usize>,
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{?\s*([#^/]?)\s*([A-Za-z_$][A-Za-z0-9_.$\-]*)\s*\}\}?")
            .expect("valid tag regex")
    })
}

/// Find every tag in `text`, in order of appearance.
pub fn scan(text: &str) -> Vec<TagToken<'_>> {
    tag_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let kind = match caps.get(1).map_or("", |m| m.as_str()) {
                "#" => TagKind::Open,
                "^" => TagKind::InvertedOpen,
                "/" => TagKind::Close,
                _ => TagKind::Scalar,
            };
            Some(TagToken {
                kind,
                name: caps.get(2)?.as_str(),
                range: whole.range(),
            })
        })
        .collect()
}

/// A parsed template fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// Literal markup copied to the output
    Text(&'a str),
    /// Scalar substitution
    Value(&'a str),
    /// Loop or conditional block
    Section {
        name: &'a str,
        inverted: bool,
        children: Vec<Node<'a>>,
    },
}

/// Parse `source` into a tree of text, values and sections.
///
/// `tokens` are the tags of `source` in order, with non-overlapping ranges.
/// A token's range is what the tag replaces; it may be wider than the tag
/// itself. Everything between tokens is kept as literal text.
///
/// # Errors
///
/// Returns a [`RenderError`] naming the tag when a close tag has no matching
/// open tag, closes a different block, or an open tag is never closed.
pub fn parse<'a>(
    source: &'a str,
    tokens: Vec<TagToken<'a>>,
) -> Result<Vec<Node<'a>>, RenderError> {
    struct Frame<'a> {
        name: &'a str,
        inverted: bool,
        children: Vec<Node<'a>>,
    }

    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut root: Vec<Node<'_>> = Vec::new();
    let mut last = 0;

    for token in tokens {
        let current = stack.last_mut().map_or(&mut root, |frame| &mut frame.children);
        if token.range.start > last {
            current.push(Node::Text(&source[last..token.range.start]));
        }
        last = token.range.end;

        match token.kind {
            TagKind::Scalar => current.push(Node::Value(token.name)),
            TagKind::Open | TagKind::InvertedOpen => stack.push(Frame {
                name: token.name,
                inverted: token.kind == TagKind::InvertedOpen,
                children: Vec::new(),
            }),
            TagKind::Close => {
                let Some(frame) = stack.pop() else {
                    return Err(RenderError::new(
                        Some(token.name),
                        format!("Unopened loop: '{{/{}}}' has no matching opening tag", token.name),
                    ));
                };
                if frame.name != token.name {
                    return Err(RenderError::new(
                        Some(frame.name),
                        format!(
                            "Closing tag does not match: '{{#{}}}' is closed by '{{/{}}}'",
                            frame.name, token.name
                        ),
                    ));
                }
                let section = Node::Section {
                    name: frame.name,
                    inverted: frame.inverted,
                    children: frame.children,
                };
                stack.last_mut().map_or(&mut root, |f| &mut f.children).push(section);
            }
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(RenderError::new(
            Some(frame.name),
            format!("Unclosed loop: '{{#{}}}' is never closed", frame.name),
        ));
    }

    if last < source.len() {
        root.push(Node::Text(&source[last..]));
    }
    Ok(root)
}
