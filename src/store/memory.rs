//! Process-local stores backed by concurrent maps.
//!
//! Besides serving as lightweight backends, both stores count calls and can be
//! told to fail individual operations, which lets tests observe exactly which
//! side effects a generation run performed.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::{DashMap, DashSet};

use super::{BlobStore, RecordStore, StoreError, validate_location};
use crate::models::{AuditEntry, CaseRecord, Office, TemplateReference, User};

/// In-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    cases: DashMap<String, CaseRecord>,
    users: DashMap<String, User>,
    offices: DashMap<String, Office>,
    templates: DashMap<String, TemplateReference>,
    audit: DashMap<String, Vec<AuditEntry>>,
    failing: DashSet<&'static str>,
    update_calls: AtomicUsize,
    usage_increments: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_case(&self, record: CaseRecord) {
        self.cases.insert(record.id.clone(), record);
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_office(&self, office: Office) {
        self.offices.insert(office.id.clone(), office);
    }

    pub fn insert_template(&self, template: TemplateReference) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Make every later call of `operation` fail with a backend error.
    ///
    /// `operation` is the [`RecordStore`] method name, e.g. `"update_case"`.
    pub fn fail_operation(&self, operation: &'static str) {
        self.failing.insert(operation);
    }

    /// Audit entries of one case, oldest first.
    pub fn audit_entries(&self, case_id: &str) -> Vec<AuditEntry> {
        self.audit.get(case_id).map(|entries| entries.clone()).unwrap_or_default()
    }

    /// Number of `update_case` calls, successful or not.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Number of successful usage counter increments.
    pub fn usage_increments(&self) -> usize {
        self.usage_increments.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.failing.contains(operation) {
            return Err(StoreError::Backend(format!("{operation} is unavailable")));
        }
        Ok(())
    }
}

impl RecordStore for MemoryRecordStore {
    async fn get_case(&self, id: &str) -> Result<CaseRecord, StoreError> {
        self.check("get_case")?;
        self.cases
            .get(id)
            .map(|record| record.clone())
            .ok_or_else(|| StoreError::not_found("case", id))
    }

    async fn update_case(&self, record: &CaseRecord) -> Result<CaseRecord, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check("update_case")?;
        if !self.cases.contains_key(&record.id) {
            return Err(StoreError::not_found("case", record.id.as_str()));
        }
        self.cases.insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.check("append_audit_entry")?;
        self.audit.entry(entry.case_id.clone()).or_default().push(entry);
        Ok(())
    }

    async fn get_related_users(&self, ids: &[String]) -> Result<Vec<User>, StoreError> {
        self.check("get_related_users")?;
        Ok(ids.iter().filter_map(|id| self.users.get(id).map(|user| user.clone())).collect())
    }

    async fn get_office(&self, id: &str) -> Result<Option<Office>, StoreError> {
        self.check("get_office")?;
        Ok(self.offices.get(id).map(|office| office.clone()))
    }

    async fn increment_template_usage(&self, template_id: &str) -> Result<(), StoreError> {
        self.check("increment_template_usage")?;
        let mut template = self
            .templates
            .get_mut(template_id)
            .ok_or_else(|| StoreError::not_found("template", template_id))?;
        template.usage_count += 1;
        self.usage_increments.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_template(&self, id: &str) -> Result<TemplateReference, StoreError> {
        self.check("get_template")?;
        self.templates
            .get(id)
            .map(|template| template.clone())
            .ok_or_else(|| StoreError::not_found("template", id))
    }

    async fn list_templates(&self) -> Result<Vec<TemplateReference>, StoreError> {
        self.check("list_templates")?;
        Ok(self.templates.iter().map(|entry| entry.value().clone()).collect())
    }
}

/// In-memory [`BlobStore`] producing `memory://` URLs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
    failing: DashSet<&'static str>,
    upload_calls: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, location: impl Into<String>, data: Vec<u8>) {
        self.blobs.insert(location.into(), data);
    }

    pub fn get(&self, location: &str) -> Option<Vec<u8>> {
        self.blobs.get(location).map(|data| data.clone())
    }

    /// Locations of all stored blobs, sorted.
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self.blobs.iter().map(|e| e.key().clone()).collect();
        locations.sort();
        locations
    }

    /// Make every later `download` or `upload` call fail.
    pub fn fail_operation(&self, operation: &'static str) {
        self.failing.insert(operation);
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

impl BlobStore for MemoryBlobStore {
    async fn download(&self, location: &str) -> Result<Vec<u8>, StoreError> {
        if self.failing.contains("download") {
            return Err(StoreError::Backend("download is unavailable".to_string()));
        }
        validate_location(location)?;
        self.get(location).ok_or_else(|| StoreError::not_found("blob", location))
    }

    async fn upload(&self, location: &str, data: Vec<u8>) -> Result<String, StoreError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains("upload") {
            return Err(StoreError::Backend("upload is unavailable".to_string()));
        }
        validate_location(location)?;
        self.blobs.insert(location.to_string(), data);
        Ok(format!("memory://{location}"))
    }
}
