//! Failures after rendering are warnings; the document is still delivered.

use casedoc::core::DocgenError;
use casedoc::models::TemplateReference;
use casedoc::pipeline::merge::PROFILE_UPDATE_HEADING;
use casedoc::pipeline::{GenerationPipeline, PipelineState, StepOutcome};
use casedoc::store::{MemoryBlobStore, MemoryRecordStore, RecordStore};
use casedoc::test_utils::{DocxFixture, fixtures};

fn setup(paragraph: &str) -> (MemoryRecordStore, MemoryBlobStore, TemplateReference) {
    let records = fixtures::record_store();
    let blobs = MemoryBlobStore::new();
    let template = fixtures::template("poa", "Power of attorney");
    blobs.insert("document-templates/poa.docx", DocxFixture::new().paragraph(paragraph).build());
    records.insert_template(template.clone());
    (records, blobs, template)
}

fn password(value: &str) -> Vec<(String, String)> {
    vec![("case.case_password".to_string(), value.to_string())]
}

#[tokio::test]
async fn test_persist_failure_still_returns_document() {
    let (records, blobs, template) = setup("Hasło: {case.case_password}");
    records.fail_operation("update_case");

    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    pipeline.start(Some(&template), Some("case-1")).await.unwrap();
    let outcome = pipeline.resume(&password("tajne"), true).await.unwrap();

    assert_eq!(pipeline.state(), PipelineState::Done);
    assert!(DocxFixture::document_text(&outcome.output).contains("Hasło: tajne"));
    assert!(!outcome.record_updated);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(outcome.warnings[0], DocgenError::PersistFailure { .. }));
    assert!(outcome.warnings[0].is_warning());

    // The update was attempted once; no profile change was logged
    assert_eq!(records.update_calls(), 1);
    assert!(
        records
            .audit_entries("case-1")
            .iter()
            .all(|entry| !entry.content.starts_with(PROFILE_UPDATE_HEADING))
    );
    // The tail still ran
    assert_eq!(records.usage_increments(), 1);
    assert_eq!(blobs.upload_calls(), 1);
}

#[tokio::test]
async fn test_usage_count_failure_is_a_warning() {
    let (records, blobs, template) = setup("{client.name}");
    records.fail_operation("increment_template_usage");

    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    let StepOutcome::Completed(outcome) = pipeline.start(Some(&template), Some("case-1")).await.unwrap()
    else {
        panic!("expected a completed run");
    };

    assert!(DocxFixture::document_text(&outcome.output).contains("Jan Kowalski"));
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(outcome.warnings[0], DocgenError::UsageCountFailure { .. }));
    assert_eq!(records.get_template("poa").await.unwrap().usage_count, 0);
    // The generation is logged regardless
    assert_eq!(records.audit_entries("case-1").len(), 1);
}

#[tokio::test]
async fn test_archive_failure_still_logs_generation() {
    let (records, blobs, template) = setup("{client.name}");
    blobs.fail_operation("upload");

    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    let StepOutcome::Completed(outcome) = pipeline.start(Some(&template), Some("case-1")).await.unwrap()
    else {
        panic!("expected a completed run");
    };

    assert!(outcome.archived_url.is_none());
    assert!(matches!(outcome.warnings[..], [DocgenError::ArchiveFailure { .. }]));
    let entries = records.audit_entries("case-1");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].file_locations.is_empty());
    assert_eq!(records.usage_increments(), 1);
}

#[tokio::test]
async fn test_every_tail_failure_is_collected() {
    let (records, blobs, template) = setup("{case.case_password}");
    records.fail_operation("update_case");
    records.fail_operation("increment_template_usage");
    records.fail_operation("append_audit_entry");
    blobs.fail_operation("upload");

    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    pipeline.start(Some(&template), Some("case-1")).await.unwrap();
    let outcome = pipeline.resume(&password("x"), true).await.unwrap();

    assert_eq!(DocxFixture::document_text(&outcome.output), "x");
    assert!(outcome.has_warnings());
    assert!(matches!(
        outcome.warnings[..],
        [
            DocgenError::PersistFailure { .. },
            DocgenError::ArchiveFailure { .. },
            DocgenError::UsageCountFailure { .. },
            DocgenError::PersistFailure { .. },
        ]
    ));
    assert!(outcome.warnings.iter().all(DocgenError::is_warning));
}

#[tokio::test]
async fn test_profile_log_failure_keeps_saved_record() {
    let (records, blobs, template) = setup("{case.case_password}");
    records.fail_operation("append_audit_entry");

    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    pipeline.start(Some(&template), Some("case-1")).await.unwrap();
    let outcome = pipeline.resume(&password("x"), true).await.unwrap();

    assert!(outcome.record_updated);
    assert_eq!(
        records.get_case("case-1").await.unwrap().immigration_case.case_password.as_deref(),
        Some("x")
    );
    // Profile log and generation log both failed
    assert_eq!(outcome.warnings.len(), 2);
}
