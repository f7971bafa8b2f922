//! End-to-end tests of the `casedoc` binary.

use anyhow::Result;
use casedoc::store::RecordStore;
use casedoc::test_utils::DocxFixture;

use crate::common::TestStore;

#[tokio::test]
async fn test_tags_lists_template_tags_with_labels() -> Result<()> {
    let env = TestStore::new().await?;
    let path = env.work_path().join("letter.docx");
    std::fs::write(
        &path,
        DocxFixture::new()
            .split_runs(&["{client.em", "ail}"])
            .paragraph("{#assignees}{name}{/assignees}")
            .build(),
    )?;

    let output = env.run_casedoc(&["tags", path.to_str().unwrap()])?;
    output
        .assert_success()
        .assert_stdout_contains("client.email")
        .assert_stdout_contains("(Email Address)")
        .assert_stdout_contains("assignees");
    Ok(())
}

#[tokio::test]
async fn test_tags_reference_table_as_json() -> Result<()> {
    let env = TestStore::new().await?;
    let output = env.run_casedoc(&["tags", "--reference", "--format", "json"])?;
    output.assert_success();

    let rows: serde_json::Value = serde_json::from_str(&output.stdout)?;
    let first = &rows[0];
    assert_eq!(first["tag"], "client.name");
    assert_eq!(first["record_path"], "name");
    Ok(())
}

#[tokio::test]
async fn test_check_reports_missing_fields() -> Result<()> {
    let env = TestStore::new().await?;
    env.add_template(
        "poa",
        "Power of attorney",
        DocxFixture::new().paragraph("{client.name} {case.case_password}"),
    )
    .await?;
    let store = env.store_arg();

    let output = env.run_casedoc(&["check", "--store", &store, "--case", "case-1", "--template", "poa"])?;
    output
        .assert_success()
        .assert_stdout_contains("1 missing field(s) for 'Power of attorney'")
        .assert_stdout_contains("case.case_password");

    let output = env.run_casedoc(&[
        "check", "--store", &store, "--case", "case-1", "--template", "poa", "--format", "json",
    ])?;
    output.assert_success();
    let missing: serde_json::Value = serde_json::from_str(&output.stdout)?;
    assert_eq!(missing[0]["label"], "Password to Case");
    Ok(())
}

#[tokio::test]
async fn test_generate_without_values_fails_when_not_interactive() -> Result<()> {
    let env = TestStore::new().await?;
    env.add_template("poa", "Power of attorney", DocxFixture::new().paragraph("{case.case_password}"))
        .await?;
    let store = env.store_arg();

    let output =
        env.run_casedoc(&["generate", "--store", &store, "--case", "case-1", "--template", "poa"])?;
    output
        .assert_failure()
        .assert_stderr_contains("Missing values for these fields")
        .assert_stderr_contains("--set TAG=VALUE");
    assert!(!env.work_path().join("Power_of_attorney_Jan_Kowalski.docx").exists());
    assert_eq!(env.store.get_template("poa").await?.usage_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_generate_with_values_and_save() -> Result<()> {
    let env = TestStore::new().await?;
    env.add_template("poa", "Power of attorney", DocxFixture::new().paragraph("Hasło: {case.case_password}"))
        .await?;
    let store = env.store_arg();

    let output = env.run_casedoc(&[
        "generate",
        "--store",
        &store,
        "--case",
        "case-1",
        "--template",
        "poa",
        "--set",
        "case.case_password=tajne-1",
        "--save",
    ])?;
    output
        .assert_success()
        .assert_stdout_contains("Generated Power_of_attorney_Jan_Kowalski.docx")
        .assert_stdout_contains("Case record updated");

    let generated = std::fs::read(env.work_path().join("Power_of_attorney_Jan_Kowalski.docx"))?;
    assert_eq!(DocxFixture::document_text(&generated), "Hasło: tajne-1");

    let case = env.store.get_case("case-1").await?;
    assert_eq!(case.immigration_case.case_password.as_deref(), Some("tajne-1"));
    Ok(())
}

#[tokio::test]
async fn test_generate_respects_config_and_flags() -> Result<()> {
    let env = TestStore::new().await?;
    env.write_config("upload_to_profile = false\n")?;
    env.add_template("poa", "Power of attorney", DocxFixture::new().paragraph("{client.name}"))
        .await?;
    let store = env.store_arg();
    let out = env.work_path().join("out.docx");

    let output = env.run_casedoc(&[
        "generate",
        "--store",
        &store,
        "--case",
        "case-1",
        "--template",
        "poa",
        "--no-log",
        "--output",
        out.to_str().unwrap(),
    ])?;
    output.assert_success();
    assert!(!output.stdout.contains("Archived to"));
    assert_eq!(DocxFixture::document_text(&std::fs::read(&out)?), "Jan Kowalski");

    let records = env.store.load().await?;
    assert!(records.audit.is_empty());
    assert_eq!(records.templates[0].usage_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_generate_reports_unknown_tag() -> Result<()> {
    let env = TestStore::new().await?;
    env.add_template("poa", "Power of attorney", DocxFixture::new().paragraph("{clent.name}"))
        .await?;
    let store = env.store_arg();

    let output =
        env.run_casedoc(&["generate", "--store", &store, "--case", "case-1", "--template", "poa"])?;
    output.assert_failure().assert_stderr_contains("clent.name");
    Ok(())
}

#[tokio::test]
async fn test_templates_sorted_by_usage() -> Result<()> {
    let env = TestStore::new().await?;
    env.add_template("poa", "Power of attorney", DocxFixture::new().paragraph("x")).await?;
    env.add_template("res", "Residence card", DocxFixture::new().paragraph("x")).await?;
    env.store.increment_template_usage("res").await?;
    let store = env.store_arg();

    let output = env.run_casedoc(&["templates", "--store", &store])?;
    output.assert_success().assert_stdout_contains("Standard templates");
    let residence = output.stdout.find("Residence card").unwrap();
    let attorney = output.stdout.find("Power of attorney").unwrap();
    assert!(residence < attorney);

    let output = env.run_casedoc(&["templates", "--store", &store, "--search", "attorney"])?;
    output.assert_success();
    assert!(!output.stdout.contains("Residence card"));
    Ok(())
}

#[test]
fn test_missing_store_directory_fails() {
    assert_cmd::Command::cargo_bin("casedoc")
        .unwrap()
        .args(["templates", "--store", "/nonexistent/casedoc-store"])
        .env("NO_COLOR", "1")
        .assert()
        .failure()
        .stderr(predicates::str::contains("does not exist"));
}
