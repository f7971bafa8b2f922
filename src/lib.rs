//! casedoc - document generation for case records
//!
//! Fills Word (`.docx`) templates with data from an immigration case record.
//! Before rendering, the tags a template uses are checked against the record;
//! when some of them have no value the run stops and asks the operator, who
//! can optionally save the answers back into the record.
//!
//! # Architecture Overview
//!
//! A generation run is a small state machine ([`pipeline::GenerationPipeline`]):
//!
//! 1. download the template binary from the blob store
//! 2. extract its tags ([`templating::extract`])
//! 3. build the data context from the case record and related entities
//!    ([`templating::ContextBuilder`])
//! 4. detect missing fields ([`templating::detect`]); stop for input if any
//! 5. merge operator values, optionally staging a record update
//! 6. render the document ([`templating::DocxRenderer`])
//! 7. persist the record, archive the document, bump the template's usage
//!    count and log the generation; failures here are warnings only
//!
//! # Core Modules
//!
//! - [`templating`] - path resolution, tag map, context building, tag
//!   extraction, missing-field detection and DOCX rendering
//! - [`pipeline`] - the generation state machine and its best-effort tail
//! - [`store`] - record and blob store contracts, with in-memory and
//!   directory-backed implementations
//! - [`models`] - case records, users, offices, templates, audit entries
//! - [`catalog`] - template ordering, search and output file names
//! - [`config`] - generator configuration (`~/.casedoc/config.toml`)
//! - [`core`] - the error taxonomy and user-facing error formatting
//! - [`cli`] - the `casedoc` command line
//!
//! # Example
//!
//! ```rust,no_run
//! use casedoc::pipeline::{GenerationPipeline, StepOutcome};
//! use casedoc::store::{FsStore, RecordStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = FsStore::open("./office")?;
//! let template = store.get_template("poa").await?;
//!
//! let mut pipeline = GenerationPipeline::new(&store, &store);
//! let outcome = match pipeline.start(Some(&template), Some("c-17")).await? {
//!     StepOutcome::Completed(outcome) => outcome,
//!     StepOutcome::AwaitingInput(missing) => {
//!         let values: Vec<_> = missing
//!             .iter()
//!             .map(|field| (field.path.clone(), "n/a".to_string()))
//!             .collect();
//!         pipeline.resume(&values, false).await?
//!     }
//! };
//! std::fs::write(&outcome.file_name, &outcome.output)?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod templating;

// test_utils is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
