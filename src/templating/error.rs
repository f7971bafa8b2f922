//! Structured template rendering errors.
//!
//! A renderer reports a mismatch between the template and the data with the
//! offending tag (when it can tell) and a short explanation. These are the
//! two facts an operator needs to fix either the template or the case.

use std::fmt;

/// Error raised by a [`super::TemplateRenderer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderError {
    /// Offending tag name, without braces
    pub tag: Option<String>,
    /// What is wrong with it
    pub explanation: Option<String>,
    /// Known names close to the offending one
    pub suggestions: Vec<String>,
}

impl RenderError {
    pub fn new(tag: Option<&str>, explanation: impl Into<String>) -> Self {
        Self {
            tag: tag.map(str::to_string),
            explanation: Some(explanation.into()),
            suggestions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Multi-line message for terminal output.
    pub fn format_with_context(&self) -> String {
        let mut msg = String::new();
        msg.push_str("ERROR: Template Does Not Match Data\n\n");

        if let Some(tag) = &self.tag {
            msg.push_str(&format!("Tag: {{{tag}}}\n"));
        }
        if let Some(explanation) = &self.explanation {
            msg.push_str(&format!("Problem: {explanation}\n"));
        }
        if !self.suggestions.is_empty() {
            msg.push_str("\nDid you mean one of these?\n");
            for suggestion in &self.suggestions {
                msg.push_str(&format!("  - {suggestion}\n"));
            }
        }
        msg
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.tag, &self.explanation) {
            (Some(tag), Some(explanation)) => write!(f, "{explanation} (tag '{tag}')"),
            (Some(tag), None) => write!(f, "template error at tag '{tag}'"),
            (None, Some(explanation)) => write!(f, "{explanation}"),
            (None, None) => write!(f, "template error"),
        }
    }
}

impl std::error::Error for RenderError {}
