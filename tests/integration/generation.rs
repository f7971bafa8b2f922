//! Full generation runs against in-memory stores.

use casedoc::core::DocgenError;
use casedoc::models::TemplateReference;
use casedoc::pipeline::merge::PROFILE_UPDATE_HEADING;
use casedoc::pipeline::{GenerationPipeline, PipelineState, StepOutcome};
use casedoc::store::{MemoryBlobStore, MemoryRecordStore, RecordStore};
use casedoc::templating::{ContextBuilder, FixedClock};
use chrono::NaiveDate;
use casedoc::test_utils::{DocxFixture, fixtures, init_test_logging};

fn setup(document: DocxFixture) -> (MemoryRecordStore, MemoryBlobStore, TemplateReference) {
    init_test_logging(None);
    let records = fixtures::record_store();
    let blobs = MemoryBlobStore::new();
    let template = fixtures::template("poa", "Power of attorney");
    blobs.insert(format!("document-templates/{}", template.storage_path), document.build());
    records.insert_template(template.clone());
    (records, blobs, template)
}

fn values(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(tag, value)| (tag.to_string(), value.to_string())).collect()
}

#[tokio::test]
async fn test_complete_record_generates_without_input() {
    let (records, blobs, template) = setup(
        DocxFixture::new()
            .paragraph("Pełnomocnictwo dla {client.name}")
            .paragraph("Sprawa {case.case_number} w {case.office_name}")
            .paragraph("{#assignees}{name}; {/assignees}")
            .footer("Wygenerowano {date.today}"),
    );
    let clock = FixedClock(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    let mut pipeline = GenerationPipeline::new(&records, &blobs)
        .with_context_builder(ContextBuilder::with_clock(clock));

    let outcome = pipeline.start(Some(&template), Some("case-1")).await.unwrap();
    let StepOutcome::Completed(outcome) = outcome else {
        panic!("a complete record should not stop for input");
    };

    assert_eq!(pipeline.state(), PipelineState::Done);
    let text = DocxFixture::document_text(&outcome.output);
    assert!(text.contains("Pełnomocnictwo dla Jan Kowalski"));
    assert!(text.contains("Sprawa WSC-II-S.6151.1234.2026 w Mazowiecki Urząd Wojewódzki"));
    assert!(text.contains("Anna Nowak; Piotr Wiśniewski; "));
    assert!(DocxFixture::part(&outcome.output, "word/footer1.xml").contains("19.10.2026"));

    assert_eq!(outcome.file_name, "Power_of_attorney_Jan_Kowalski.docx");
    assert!(outcome.warnings.is_empty());
    assert!(!outcome.record_updated);
    assert_eq!(records.update_calls(), 0);
    assert_eq!(records.usage_increments(), 1);
    assert_eq!(records.get_template("poa").await.unwrap().usage_count, 1);
}

#[tokio::test]
async fn test_archived_document_is_logged_with_its_location() {
    let (records, blobs, template) = setup(DocxFixture::new().paragraph("{client.name}"));
    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    let StepOutcome::Completed(outcome) = pipeline.start(Some(&template), Some("case-1")).await.unwrap()
    else {
        panic!("expected a completed run");
    };

    let location = outcome.archived_location.clone().unwrap();
    assert!(location.starts_with("client-files/case-1/"));
    assert_eq!(blobs.get(&location), Some(outcome.output.clone()));
    assert_eq!(outcome.archived_url, Some(format!("memory://{location}")));

    let entries = records.audit_entries("case-1");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "Generated document: \"Power of attorney\"");
    assert_eq!(entries[0].file_locations, vec![location]);
}

#[tokio::test]
async fn test_missing_fields_stop_the_run() {
    let (records, blobs, template) = setup(
        DocxFixture::new().paragraph("{client.name} {case.case_password} {questionnaire.personal_data.pesel}"),
    );
    let mut pipeline = GenerationPipeline::new(&records, &blobs);

    let StepOutcome::AwaitingInput(missing) =
        pipeline.start(Some(&template), Some("case-1")).await.unwrap()
    else {
        panic!("expected the run to await input");
    };

    let paths: Vec<_> = missing.iter().map(|field| field.path.as_str()).collect();
    assert_eq!(paths, vec!["case.case_password", "questionnaire.personal_data.pesel"]);
    assert_eq!(missing[0].label, "Password to Case");
    assert!(missing.iter().all(|field| field.value.is_empty()));

    // Nothing has been rendered or counted yet
    assert_eq!(pipeline.state(), PipelineState::AwaitingInput);
    assert_eq!(records.usage_increments(), 0);
    assert_eq!(blobs.upload_calls(), 0);
}

#[tokio::test]
async fn test_resume_without_persist_leaves_record_untouched() {
    let (records, blobs, template) = setup(DocxFixture::new().paragraph("Hasło: {case.case_password}"));
    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    pipeline.start(Some(&template), Some("case-1")).await.unwrap();

    let outcome = pipeline
        .resume(&values(&[("case.case_password", "tajne-123")]), false)
        .await
        .unwrap();

    assert!(DocxFixture::document_text(&outcome.output).contains("Hasło: tajne-123"));
    assert!(!outcome.record_updated);
    assert_eq!(records.update_calls(), 0);
    assert_eq!(records.get_case("case-1").await.unwrap().immigration_case.case_password, None);
    assert!(
        records
            .audit_entries("case-1")
            .iter()
            .all(|entry| !entry.content.starts_with(PROFILE_UPDATE_HEADING))
    );
}

#[tokio::test]
async fn test_resume_with_persist_updates_record_once() {
    let (records, blobs, template) = setup(
        DocxFixture::new().paragraph("{case.case_password} / {questionnaire.personal_data.pesel}"),
    );
    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    pipeline.start(Some(&template), Some("case-1")).await.unwrap();

    let outcome = pipeline
        .resume(
            &values(&[
                ("case.case_password", "tajne-123"),
                ("questionnaire.personal_data.pesel", "90010112345"),
            ]),
            true,
        )
        .await
        .unwrap();

    assert!(outcome.record_updated);
    assert!(outcome.warnings.is_empty());
    assert_eq!(records.update_calls(), 1);

    let record = records.get_case("case-1").await.unwrap();
    assert_eq!(record.immigration_case.case_password.as_deref(), Some("tajne-123"));
    let pesel = record.questionnaire.and_then(|q| q.personal_data).and_then(|p| p.pesel);
    assert_eq!(pesel.as_deref(), Some("90010112345"));
    // Untouched fields survive the update
    assert_eq!(record.contact.email.as_deref(), Some("jan.kowalski@example.com"));

    let profile_entries: Vec<_> = records
        .audit_entries("case-1")
        .into_iter()
        .filter(|entry| entry.content.starts_with(PROFILE_UPDATE_HEADING))
        .collect();
    assert_eq!(profile_entries.len(), 1);
    assert!(profile_entries[0].content.contains("- \"Password to Case\" was updated."));
    assert!(profile_entries[0].content.contains("- \"PESEL Number (Questionnaire)\" was updated."));
}

#[tokio::test]
async fn test_unmapped_values_render_but_are_not_saved() {
    let (records, blobs, template) =
        setup(DocxFixture::new().paragraph("{case.case_password} {custom.note}"));
    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    let StepOutcome::AwaitingInput(missing) =
        pipeline.start(Some(&template), Some("case-1")).await.unwrap()
    else {
        panic!("expected the run to await input");
    };
    assert_eq!(missing.len(), 1);

    let outcome = pipeline
        .resume(&values(&[("case.case_password", "p"), ("custom.note", "ad hoc")]), true)
        .await
        .unwrap();

    assert_eq!(DocxFixture::document_text(&outcome.output), "p ad hoc");
    assert_eq!(records.update_calls(), 1);
}

#[tokio::test]
async fn test_unknown_tag_fails_rendering() {
    let (records, blobs, template) =
        setup(DocxFixture::new().paragraph("{clent.name} {case.case_password}"));
    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    pipeline.start(Some(&template), Some("case-1")).await.unwrap();

    let err = pipeline.resume(&values(&[("case.case_password", "p")]), true).await.unwrap_err();

    match &err {
        DocgenError::RenderMismatch {
            tag,
            explanation,
            suggestions,
        } => {
            assert_eq!(tag.as_deref(), Some("clent.name"));
            assert!(explanation.as_deref().unwrap_or_default().contains("does not exist"));
            assert!(suggestions.contains(&"client.name".to_string()));
        }
        other => panic!("expected a render mismatch, got {other:?}"),
    }
    assert_eq!(pipeline.state(), PipelineState::Error);
    assert_eq!(records.update_calls(), 0);
    assert_eq!(records.usage_increments(), 0);
    assert!(records.audit_entries("case-1").is_empty());
}

#[tokio::test]
async fn test_unknown_root_without_missing_fields_fails_immediately() {
    let (records, blobs, template) = setup(DocxFixture::new().paragraph("{invoice.total}"));
    let mut pipeline = GenerationPipeline::new(&records, &blobs);

    let err = pipeline.start(Some(&template), Some("case-1")).await.unwrap_err();
    assert!(matches!(err, DocgenError::RenderMismatch { .. }));
    assert_eq!(pipeline.state(), PipelineState::Error);
}

#[tokio::test]
async fn test_malformed_template_is_fatal() {
    init_test_logging(None);
    let records = fixtures::record_store();
    let blobs = MemoryBlobStore::new();
    let template = fixtures::template("broken", "Broken");
    blobs.insert("document-templates/broken.docx", b"not a zip archive".to_vec());
    records.insert_template(template.clone());

    let mut pipeline = GenerationPipeline::new(&records, &blobs);
    let err = pipeline.start(Some(&template), Some("case-1")).await.unwrap_err();
    assert!(matches!(err, DocgenError::MalformedTemplate { .. }));
    assert_eq!(pipeline.state(), PipelineState::Error);
}

#[tokio::test]
async fn test_check_reports_without_side_effects() {
    let (records, blobs, template) = setup(DocxFixture::new().paragraph("{case.case_password}"));
    let mut pipeline = GenerationPipeline::new(&records, &blobs);

    let missing = pipeline.check(Some(&template), Some("case-1")).await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(records.usage_increments(), 0);
    assert_eq!(blobs.upload_calls(), 0);
    assert!(records.audit_entries("case-1").is_empty());
}
