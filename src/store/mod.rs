//! Record and blob storage contracts.
//!
//! The generation pipeline talks to two stores:
//!
//! - a [`RecordStore`] owning case records, users, offices, template
//!   references and the per-case audit log,
//! - a [`BlobStore`] holding template binaries and archived documents.
//!
//! Every operation is atomic on its own; the pipeline never wraps several
//! calls in a transaction, and concurrent writers to one case record follow
//! the store's last-write-wins semantics.
//!
//! Two implementations ship with the crate: [`memory`] (process-local, used
//! by tests and embedders) and [`fs`] (a directory with a `records.json` file
//! and a `blobs/` tree, used by the CLI).

pub mod fs;
pub mod memory;

pub use fs::{FsStore, RecordsFile};
pub use memory::{MemoryBlobStore, MemoryRecordStore};

use std::future::Future;

use thiserror::Error;

use crate::models::{AuditEntry, CaseRecord, Office, TemplateReference, User};

/// Failure reported by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound {
        kind: &'static str,
        id: String,
    },

    #[error("invalid storage location '{0}'")]
    InvalidLocation(String),

    #[error("{0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid record data: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Owner of case records and their related entities.
pub trait RecordStore: Send + Sync {
    /// Fetch one case record.
    fn get_case(&self, id: &str) -> impl Future<Output = Result<CaseRecord, StoreError>> + Send;

    /// Overwrite a case record, returning the stored version.
    fn update_case(
        &self,
        record: &CaseRecord,
    ) -> impl Future<Output = Result<CaseRecord, StoreError>> + Send;

    /// Append one entry to a case's audit log.
    fn append_audit_entry(
        &self,
        entry: AuditEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Users with the given ids. Unknown ids are skipped.
    fn get_related_users(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<User>, StoreError>> + Send;

    /// An office by id, or `None` when it does not exist.
    fn get_office(&self, id: &str) -> impl Future<Output = Result<Option<Office>, StoreError>> + Send;

    /// Add one to a template's usage counter.
    fn increment_template_usage(
        &self,
        template_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetch one template reference.
    fn get_template(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<TemplateReference, StoreError>> + Send;

    /// Every known template reference.
    fn list_templates(&self) -> impl Future<Output = Result<Vec<TemplateReference>, StoreError>> + Send;
}

/// Binary storage addressed by location strings such as
/// `document-templates/visa.docx`.
pub trait BlobStore: Send + Sync {
    fn download(&self, location: &str) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;

    /// Store `data` at `location`, returning a URL for the stored object.
    fn upload(
        &self,
        location: &str,
        data: Vec<u8>,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;
}

/// Join a bucket and an object path into a blob location.
pub fn blob_location(bucket: &str, path: &str) -> String {
    let bucket = bucket.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if bucket.is_empty() {
        path.to_string()
    } else {
        format!("{bucket}/{path}")
    }
}

/// Reject locations that are empty or escape their bucket.
pub(crate) fn validate_location(location: &str) -> Result<(), StoreError> {
    let invalid = location.is_empty()
        || location.starts_with('/')
        || location.contains('\\')
        || location.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(StoreError::InvalidLocation(location.to_string()));
    }
    Ok(())
}
