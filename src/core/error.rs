//! Error handling for casedoc
//!
//! This module provides the error taxonomy of the document generation engine and
//! user-friendly error reporting for the CLI. The error system follows two rules:
//! 1. **Strongly-typed errors** ([`DocgenError`]) so callers can tell a fatal
//!    template problem apart from a bookkeeping warning
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions
//!
//! # Error Categories
//!
//! - **Fatal before rendering**: [`DocgenError::MissingInput`], [`DocgenError::CaseNotFound`],
//!   [`DocgenError::DownloadFailure`], [`DocgenError::MalformedTemplate`]
//! - **Fatal at rendering**: [`DocgenError::RenderMismatch`]
//! - **Warnings after rendering**: [`DocgenError::PersistFailure`],
//!   [`DocgenError::UsageCountFailure`], [`DocgenError::ArchiveFailure`]
//!
//! Use [`user_friendly_error`] to convert any error into a displayable
//! [`ErrorContext`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use casedoc::core::{DocgenError, user_friendly_error};
//!
//! let error = DocgenError::RenderMismatch {
//!     tag: Some("client.emial".to_string()),
//!     explanation: Some("The tag does not exist in the data".to_string()),
//!     suggestions: vec!["client.email".to_string()],
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with the offending tag
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::store::StoreError;
use crate::templating::RenderError;

/// The main error type for document generation.
///
/// Every variant carries owned strings only, so errors can be cloned into
/// pipeline outcomes and warning lists without losing information.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocgenError {
    /// The template binary is not a valid archive or has no text parts.
    #[error("Malformed template: {reason}")]
    MalformedTemplate {
        /// Why the archive was rejected
        reason: String,
    },

    /// The template could not be fetched from the blob store.
    #[error("Failed to download template from '{location}': {reason}")]
    DownloadFailure {
        /// Storage location that was requested
        location: String,
        /// Underlying store error
        reason: String,
    },

    /// The template and the context disagree about the shape of the data.
    ///
    /// This is the most actionable error for operators: `tag` names the
    /// placeholder that has to be fixed in the template.
    #[error("{}", format_render_mismatch(.tag.as_deref(), .explanation.as_deref()))]
    RenderMismatch {
        /// Offending tag, when the renderer could identify it
        tag: Option<String>,
        /// Renderer's explanation of the conflict
        explanation: Option<String>,
        /// Context keys close to the offending tag
        suggestions: Vec<String>,
    },

    /// Saving corrections or the audit entry failed after rendering.
    #[error("Failed to save changes for case '{case_id}': {reason}")]
    PersistFailure {
        /// Case that was being updated
        case_id: String,
        /// Underlying store error
        reason: String,
    },

    /// The template usage counter could not be incremented.
    #[error("Failed to increment usage count of template '{template_id}': {reason}")]
    UsageCountFailure {
        /// Template whose counter was not incremented
        template_id: String,
        /// Underlying store error
        reason: String,
    },

    /// The rendered document could not be archived onto the case.
    #[error("Failed to archive generated document '{file_name}': {reason}")]
    ArchiveFailure {
        /// File name the document would have been stored under
        file_name: String,
        /// Underlying store error
        reason: String,
    },

    /// A required pipeline input was not supplied.
    #[error("Missing required input: {what}")]
    MissingInput {
        /// Name of the absent input
        what: String,
    },

    /// The case record does not exist in the record store.
    #[error("Case '{id}' not found")]
    CaseNotFound {
        /// Requested case id
        id: String,
    },

    /// The template reference does not exist in the record store.
    #[error("Template '{id}' not found")]
    TemplateNotFound {
        /// Requested template id
        id: String,
    },

    /// A pipeline method was called in a state that does not allow it.
    #[error("Cannot {action} while the pipeline is {state}")]
    InvalidTransition {
        /// The attempted action
        action: String,
        /// The state the pipeline was in
        state: String,
    },

    /// A record store call failed before rendering started.
    #[error("Record store operation '{operation}' failed: {reason}")]
    Store {
        /// Store operation name
        operation: String,
        /// Underlying store error
        reason: String,
    },
}

fn format_render_mismatch(tag: Option<&str>, explanation: Option<&str>) -> String {
    let explanation = explanation.unwrap_or("the template does not match the data");
    match tag {
        Some(tag) => {
            format!("Template Error: {explanation}. Check tag '{{{tag}}}' in your template.")
        }
        None => format!("Template Error: {explanation}."),
    }
}

impl DocgenError {
    /// Whether this error is reported as a warning on an otherwise successful run.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::PersistFailure { .. } | Self::UsageCountFailure { .. } | Self::ArchiveFailure { .. }
        )
    }

    pub(crate) fn store(operation: &str, err: &StoreError) -> Self {
        Self::Store {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<RenderError> for DocgenError {
    fn from(err: RenderError) -> Self {
        Self::RenderMismatch {
            tag: err.tag,
            explanation: err.explanation,
            suggestions: err.suggestions,
        }
    }
}

/// Error context wrapper that provides user-friendly error information.
///
/// When displayed, errors show:
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context about the error in yellow (optional)
/// 3. **Suggestion**: Actionable steps to resolve the issue in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DocgenError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: DocgenError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining why the error occurred.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Build the suggestion text for a known error.
fn create_error_context(error: DocgenError) -> ErrorContext {
    match &error {
        DocgenError::RenderMismatch {
            tag,
            suggestions,
            ..
        } => {
            let mut ctx = ErrorContext::new(error.clone());
            if !suggestions.is_empty() {
                ctx = ctx.with_details(format!("Did you mean: {}?", suggestions.join(", ")));
            }
            match tag {
                Some(tag) => ctx.with_suggestion(format!(
                    "Fix the tag '{{{tag}}}' in the template, or add the missing data to the case"
                )),
                None => ctx.with_suggestion(
                    "Check that every {#block} in the template has a matching {/block}",
                ),
            }
        }
        DocgenError::MalformedTemplate {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Re-save the template as a Word document (.docx) and upload it again")
            .with_details("Templates must be .docx archives containing word/document.xml"),
        DocgenError::DownloadFailure {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the template's storage location, then retry the generation"),
        DocgenError::CaseNotFound {
            ..
        }
        | DocgenError::TemplateNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("List available records with 'casedoc templates --store <dir>'"),
        DocgenError::MissingInput {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Select both a template and a case before generating"),
        DocgenError::InvalidTransition {
            ..
        } => ErrorContext::new(error).with_details(
            "A generation run is resumed at most once, and only while awaiting input",
        ),
        _ => ErrorContext::new(error),
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Known [`DocgenError`]s receive tailored suggestions; anything else is
/// wrapped with its full cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(docgen_error) = error.downcast_ref::<DocgenError>() {
        return create_error_context(docgen_error.clone());
    }

    if let Some(ctx) = error.downcast_ref::<ErrorContext>() {
        return ErrorContext {
            error: ctx.error.clone(),
            suggestion: ctx.suggestion.clone(),
            details: ctx.details.clone(),
        };
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(DocgenError::Store {
            operation: "load config".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your casedoc config file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(DocgenError::Store {
        operation: "command".to_string(),
        reason: message,
    })
}
