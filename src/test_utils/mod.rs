//! Test utilities for casedoc
//!
//! Helpers for unit and integration tests: an in-memory `.docx` builder,
//! sample case data, pre-seeded stores, and one-time logging setup.
//!
//! # Example
//!
//! ```rust,no_run
//! use casedoc::test_utils::{DocxFixture, fixtures};
//!
//! let template = DocxFixture::new()
//!     .paragraph("Dear {client.name},")
//!     .split_runs(&["case {case.case_", "number}"])
//!     .build();
//! let records = fixtures::record_store();
//! ```

pub mod docx;
pub mod fixtures;

pub use docx::DocxFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; without either, tests run silently.
///
/// ```bash
/// RUST_LOG=casedoc=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
