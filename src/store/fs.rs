//! Directory-backed store used by the command line.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── records.json     cases, users, offices, templates, audit log
//! └── blobs/
//!     ├── document-templates/visa.docx
//!     └── client-files/<case_id>/<uuid>-<file>.docx
//! ```
//!
//! `records.json` is read on every call and rewritten atomically (temp file
//! plus rename) on every mutation. Mutations within one process are
//! serialized; concurrent processes follow last-write-wins.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{BlobStore, RecordStore, StoreError, validate_location};
use crate::models::{AuditEntry, CaseRecord, Office, TemplateReference, User};

/// Name of the records file inside a store directory.
pub const RECORDS_FILE: &str = "records.json";

/// Name of the blob directory inside a store directory.
pub const BLOBS_DIR: &str = "blobs";

/// Contents of `records.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsFile {
    pub cases: Vec<CaseRecord>,
    pub users: Vec<User>,
    pub offices: Vec<Office>,
    pub templates: Vec<TemplateReference>,
    pub audit: Vec<AuditEntry>,
}

/// Store rooted at a directory.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsStore {
    /// Open an existing store directory.
    ///
    /// # Errors
    ///
    /// Fails if `root` is not a directory or has no `records.json`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("Store directory does not exist: {}", root.display());
        }
        let records = root.join(RECORDS_FILE);
        if !records.is_file() {
            anyhow::bail!(
                "Store directory {} has no {RECORDS_FILE}",
                root.display()
            );
        }
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Create a store directory seeded with `records`.
    pub async fn create(root: impl Into<PathBuf>, records: &RecordsFile) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(BLOBS_DIR))
            .await
            .with_context(|| format!("Failed to create store directory: {}", root.display()))?;
        let store = Self {
            root,
            write_lock: Mutex::new(()),
        };
        store.save(records).await.context("Failed to write initial records")?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the whole records file.
    pub async fn load(&self) -> Result<RecordsFile, StoreError> {
        let bytes = tokio::fs::read(self.root.join(RECORDS_FILE)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, records: &RecordsFile) -> Result<(), StoreError> {
        let path = self.root.join(RECORDS_FILE);
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(records)?;
        {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&content).await?;
            file.sync_all().await?;
        }
        // Atomic rename
        tokio::fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    /// Load, apply `mutate`, save, all under the write lock.
    async fn modify<T>(
        &self,
        mutate: impl FnOnce(&mut RecordsFile) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let result = mutate(&mut records)?;
        self.save(&records).await?;
        Ok(result)
    }

    fn blob_path(&self, location: &str) -> Result<PathBuf, StoreError> {
        validate_location(location)?;
        Ok(self.root.join(BLOBS_DIR).join(location))
    }
}

impl RecordStore for FsStore {
    async fn get_case(&self, id: &str) -> Result<CaseRecord, StoreError> {
        self.load()
            .await?
            .cases
            .into_iter()
            .find(|case| case.id == id)
            .ok_or_else(|| StoreError::not_found("case", id))
    }

    async fn update_case(&self, record: &CaseRecord) -> Result<CaseRecord, StoreError> {
        self.modify(|records| {
            let slot = records
                .cases
                .iter_mut()
                .find(|case| case.id == record.id)
                .ok_or_else(|| StoreError::not_found("case", record.id.as_str()))?;
            *slot = record.clone();
            Ok(record.clone())
        })
        .await
    }

    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.modify(|records| {
            records.audit.push(entry);
            Ok(())
        })
        .await
    }

    async fn get_related_users(&self, ids: &[String]) -> Result<Vec<User>, StoreError> {
        let users = self.load().await?.users;
        Ok(ids.iter().filter_map(|id| users.iter().find(|u| &u.id == id).cloned()).collect())
    }

    async fn get_office(&self, id: &str) -> Result<Option<Office>, StoreError> {
        Ok(self.load().await?.offices.into_iter().find(|office| office.id == id))
    }

    async fn increment_template_usage(&self, template_id: &str) -> Result<(), StoreError> {
        self.modify(|records| {
            let template = records
                .templates
                .iter_mut()
                .find(|t| t.id == template_id)
                .ok_or_else(|| StoreError::not_found("template", template_id))?;
            template.usage_count += 1;
            Ok(())
        })
        .await
    }

    async fn get_template(&self, id: &str) -> Result<TemplateReference, StoreError> {
        self.load()
            .await?
            .templates
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::not_found("template", id))
    }

    async fn list_templates(&self) -> Result<Vec<TemplateReference>, StoreError> {
        Ok(self.load().await?.templates)
    }
}

impl BlobStore for FsStore {
    async fn download(&self, location: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.blob_path(location)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::not_found("blob", location))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upload(&self, location: &str, data: Vec<u8>) -> Result<String, StoreError> {
        let path = self.blob_path(location)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(format!("file://{}", path.display()))
    }
}
