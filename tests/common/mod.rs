//! Shared helpers for integration tests.

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use casedoc::models::TemplateReference;
use casedoc::store::{BlobStore, FsStore, blob_location};
use casedoc::test_utils::{DocxFixture, fixtures};

/// A store directory seeded with the sample case, plus a config file.
pub struct TestStore {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    store_dir: PathBuf,
    work_dir: PathBuf,
    config_path: PathBuf,
    pub store: FsStore,
}

impl TestStore {
    /// Create a store with the sample records and default configuration.
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let store_dir = temp_dir.path().join("store");
        let work_dir = temp_dir.path().join("work");
        let config_path = temp_dir.path().join("config.toml");

        fs::create_dir_all(&work_dir)?;
        fs::write(&config_path, "add_log_entry = true\nupload_to_profile = true\n")?;
        let store = FsStore::create(&store_dir, &fixtures::records_file()).await?;

        Ok(Self {
            _temp_dir: temp_dir,
            store_dir,
            work_dir,
            config_path,
            store,
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_dir
    }

    /// Directory commands run in; generated files land here.
    pub fn work_path(&self) -> &Path {
        &self.work_dir
    }

    /// Overwrite the configuration file.
    pub fn write_config(&self, content: &str) -> Result<()> {
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Register a template and write its binary under the template bucket.
    pub async fn add_template(&self, id: &str, name: &str, document: DocxFixture) -> Result<TemplateReference> {
        let template = fixtures::template(id, name);
        self.store
            .upload(&blob_location("document-templates", &template.storage_path), document.build())
            .await?;

        let mut records = self.store.load().await?;
        records.templates.push(template.clone());
        fs::write(
            self.store_dir.join("records.json"),
            serde_json::to_vec_pretty(&records)?,
        )?;
        Ok(template)
    }

    /// Run the casedoc binary from the work directory with stdin closed.
    pub fn run_casedoc(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::cargo_bin("casedoc")?
            .args(args)
            .current_dir(&self.work_dir)
            .env("CASEDOC_CONFIG", &self.config_path)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .write_stdin("")
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }

    /// Store arguments for commands that take `--store`.
    pub fn store_arg(&self) -> String {
        self.store_dir.display().to_string()
    }
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStderr: {}",
            self.code, self.stderr
        );
        self
    }

    /// Assert the command failed
    pub fn assert_failure(&self) -> &Self {
        assert!(!self.success, "Command unexpectedly succeeded\nStdout: {}", self.stdout);
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
