//! Best-effort steps that run after a document was rendered.
//!
//! The rendered output is already final when these run. Each step is
//! independent: its failure is logged and collected as a warning, and never
//! prevents the following steps or the delivery of the document.

use crate::core::DocgenError;
use crate::models::AuditEntry;
use crate::store::{BlobStore, RecordStore, blob_location};

/// Warnings collected while running best-effort steps.
#[derive(Debug, Default)]
pub struct Warnings(Vec<DocgenError>);

impl Warnings {
    /// Keep the error of a failed step, if any.
    pub fn collect<T>(&mut self, step: &str, result: Result<T, DocgenError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("{} failed, continuing: {}", step, error);
                self.0.push(error);
                None
            }
        }
    }

    pub fn into_vec(self) -> Vec<DocgenError> {
        self.0
    }
}

/// Location and URL of an archived document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedFile {
    pub location: String,
    pub url: String,
}

/// Upload the rendered document under `<case_id>/<uuid>-<file_name>`.
pub async fn archive_document<B: BlobStore>(
    blobs: &B,
    bucket: &str,
    case_id: &str,
    file_name: &str,
    output: &[u8],
) -> Result<ArchivedFile, DocgenError> {
    let object = format!("{case_id}/{}-{file_name}", uuid::Uuid::new_v4());
    let location = blob_location(bucket, &object);
    let url = blobs.upload(&location, output.to_vec()).await.map_err(|e| {
        DocgenError::ArchiveFailure {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        }
    })?;
    tracing::debug!("Archived generated document at {}", location);
    Ok(ArchivedFile {
        location,
        url,
    })
}

pub async fn increment_usage<R: RecordStore>(
    records: &R,
    template_id: &str,
) -> Result<(), DocgenError> {
    records.increment_template_usage(template_id).await.map_err(|e| {
        DocgenError::UsageCountFailure {
            template_id: template_id.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Record the generation event in the case's audit log.
pub async fn log_generation<R: RecordStore>(
    records: &R,
    case_id: &str,
    template_name: &str,
    archived: Option<&ArchivedFile>,
) -> Result<(), DocgenError> {
    let mut entry = AuditEntry::new(case_id, format!("Generated document: \"{template_name}\""));
    if let Some(file) = archived {
        entry = entry.with_files(vec![file.location.clone()]);
    }
    records.append_audit_entry(entry).await.map_err(|e| DocgenError::PersistFailure {
        case_id: case_id.to_string(),
        reason: format!("failed to log generation: {e}"),
    })
}
