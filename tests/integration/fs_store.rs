//! Generation against the directory-backed store.

use anyhow::Result;
use casedoc::pipeline::{GenerationPipeline, StepOutcome};
use casedoc::store::{FsStore, RecordStore};
use casedoc::test_utils::DocxFixture;

use crate::common::TestStore;

#[tokio::test]
async fn test_generation_round_trips_through_disk() -> Result<()> {
    let env = TestStore::new().await?;
    let template = env
        .add_template("poa", "Power of attorney", DocxFixture::new().paragraph("{case.case_password}"))
        .await?;

    let mut pipeline = GenerationPipeline::new(&env.store, &env.store);
    let outcome = pipeline.start(Some(&template), Some("case-1")).await?;
    assert!(matches!(outcome, StepOutcome::AwaitingInput(_)));

    let values = vec![("case.case_password".to_string(), "dysk-42".to_string())];
    let outcome = pipeline.resume(&values, true).await?;
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    // A fresh handle sees everything the run wrote
    let reopened = FsStore::open(env.store_path())?;
    let records = reopened.load().await?;
    assert_eq!(
        records.cases[0].immigration_case.case_password.as_deref(),
        Some("dysk-42")
    );
    assert_eq!(records.templates[0].usage_count, 1);
    assert_eq!(records.audit.len(), 2);

    let location = outcome.archived_location.expect("archived");
    let archived = env.store_path().join("blobs").join(&location);
    assert_eq!(std::fs::read(archived)?, outcome.output);
    assert!(outcome.archived_url.expect("url").starts_with("file://"));
    Ok(())
}

#[tokio::test]
async fn test_missing_template_binary_is_a_download_failure() -> Result<()> {
    let env = TestStore::new().await?;
    let template = casedoc::test_utils::fixtures::template("ghost", "Ghost");

    let mut pipeline = GenerationPipeline::new(&env.store, &env.store);
    let err = pipeline.start(Some(&template), Some("case-1")).await.unwrap_err();
    assert!(matches!(err, casedoc::core::DocgenError::DownloadFailure { .. }));
    assert!(env.store.get_template("ghost").await.is_err());
    Ok(())
}
