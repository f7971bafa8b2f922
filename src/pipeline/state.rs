//! Pipeline states and run results.

use std::fmt;

use serde_json::Value;

use crate::core::DocgenError;
use crate::models::{CaseRecord, TemplateReference};
use crate::templating::MissingField;

/// Where a generation run currently is.
///
/// ```text
/// Idle → TemplateFetching → TagExtraction → FieldCheck ─┬────────────────→ Rendering → Persisting? → Done
///                                                      └→ AwaitingInput → Merging ┘
/// ```
///
/// `Error` is reachable from every step and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    TemplateFetching,
    TagExtraction,
    FieldCheck,
    AwaitingInput,
    Merging,
    Rendering,
    Persisting,
    Done,
    Error,
}

impl PipelineState {
    /// Whether the run can make no further progress.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::TemplateFetching => "fetching the template",
            Self::TagExtraction => "extracting tags",
            Self::FieldCheck => "checking fields",
            Self::AwaitingInput => "awaiting input",
            Self::Merging => "merging input",
            Self::Rendering => "rendering",
            Self::Persisting => "saving changes",
            Self::Done => "done",
            Self::Error => "failed",
        };
        f.write_str(name)
    }
}

/// Result of [`start`](super::GenerationPipeline::start).
#[derive(Debug)]
pub enum StepOutcome {
    /// The run is suspended until [`resume`](super::GenerationPipeline::resume)
    /// supplies values for these fields.
    AwaitingInput(Vec<MissingField>),
    /// Every mapped tag had a value and the document was generated.
    Completed(GenerationOutcome),
}

/// A generated document plus the non-fatal problems met on the way.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Rendered document binary
    pub output: Vec<u8>,
    /// Suggested file name, e.g. `Power_of_attorney_Jan_Kowalski.docx`
    pub file_name: String,
    /// Blob location of the archived copy, when archiving succeeded
    pub archived_location: Option<String>,
    /// URL returned by the blob store for the archived copy
    pub archived_url: Option<String>,
    /// Whether operator input was written back to the case record
    pub record_updated: bool,
    /// Failures of best-effort steps; each satisfies [`DocgenError::is_warning`]
    pub warnings: Vec<DocgenError>,
}

impl GenerationOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Everything a suspended run holds in memory between `start` and `resume`.
#[derive(Debug, Clone)]
pub(crate) struct SuspendedRun {
    pub template: TemplateReference,
    pub template_bytes: Vec<u8>,
    pub record: CaseRecord,
    pub context: Value,
    pub missing: Vec<MissingField>,
}
