//! Document templating for case files.
//!
//! Templates are `.docx` files whose text contains tags such as
//! `{client.name}`. Generating a document means:
//!
//! 1. building a data context from a case record ([`context`]),
//! 2. discovering the tags a template uses ([`extractor`]),
//! 3. finding mapped tags whose value is empty ([`missing`]),
//! 4. merging the context into the template ([`renderer`]).
//!
//! The orchestration of these steps, including operator input and write-back
//! to the case record, lives in [`crate::pipeline`].
//!
//! # Supported Features
//!
//! - Scalar substitution: `{client.name}` or `{{client.name}}`
//! - Loops over lists: `{#assignees}{name}{/assignees}`
//! - Conditions: `{#questionnaire.has_criminal_record}...{/questionnaire.has_criminal_record}`
//! - Inverted conditions: `{^client.email}no email on file{/client.email}`
//! - Tags split across formatting runs by the word processor
//! - Tags in headers, footers, footnotes and endnotes
//!
//! # Context Structure
//!
//! ```text
//! client              id, name, phone, email, nationality, passport_number, ...
//! questionnaire       the case's questionnaire, or null
//! case                immigration case data plus office_name / office_address
//! assignees[]         users assigned to the case
//! primary_assignee    first assignee, or {}
//! date                today (formatted), iso
//! ```

pub mod archive;
pub mod context;
pub mod error;
pub mod extractor;
pub mod missing;
pub mod path;
pub mod renderer;
pub mod syntax;
pub mod tag_map;

pub use context::{Clock, ContextBuilder, FixedClock, RelatedEntities, SystemClock};
pub use error::RenderError;
pub use extractor::extract;
pub use missing::{MissingField, detect};
pub use renderer::{DocxRenderer, TemplateRenderer};
pub use tag_map::{TAG_MAP, TagMapEntry};
