//! Generator configuration.
//!
//! Settings live in a TOML file, by default `~/.casedoc/config.toml`
//! (`%LOCALAPPDATA%\casedoc\config.toml` on Windows). A missing file means
//! defaults; every key is optional.
//!
//! ```toml
//! template_bucket = "document-templates"
//! generated_bucket = "client-files"
//! date_format = "%d.%m.%Y"
//! add_log_entry = true
//! upload_to_profile = true
//! linebreaks = true
//! max_template_size = 20971520
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::templating::context::DEFAULT_DATE_FORMAT;

/// Default largest template binary: 20 MiB.
const fn default_max_template_size() -> u64 {
    20 * 1024 * 1024
}

const fn default_true() -> bool {
    true
}

fn default_template_bucket() -> String {
    "document-templates".to_string()
}

fn default_generated_bucket() -> String {
    "client-files".to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

/// Settings of the document generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Blob bucket templates are downloaded from
    #[serde(default = "default_template_bucket")]
    pub template_bucket: String,

    /// Blob bucket generated documents are archived into
    #[serde(default = "default_generated_bucket")]
    pub generated_bucket: String,

    /// `strftime` format of `date.today`
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Log every generation in the case's audit trail
    #[serde(default = "default_true")]
    pub add_log_entry: bool,

    /// Archive generated documents onto the case
    #[serde(default = "default_true")]
    pub upload_to_profile: bool,

    /// Turn newlines in values into line breaks
    #[serde(default = "default_true")]
    pub linebreaks: bool,

    /// Templates above this many bytes are rejected
    #[serde(default = "default_max_template_size")]
    pub max_template_size: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template_bucket: default_template_bucket(),
            generated_bucket: default_generated_bucket(),
            date_format: default_date_format(),
            add_log_entry: true,
            upload_to_profile: true,
            linebreaks: true,
            max_template_size: default_max_template_size(),
        }
    }
}

impl GeneratorConfig {
    /// Load from the default location, or defaults if there is no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined, or the file
    /// exists but is unreadable or invalid.
    pub async fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from `path` when given, otherwise from the default location.
    ///
    /// An explicitly given path must exist.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(&path).await,
            None => Self::load().await,
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or holds
    /// invalid values.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate().with_context(|| format!("Invalid config in {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Platform-specific default path of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home (or local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("casedoc")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".casedoc")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Check value constraints that TOML types cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.template_bucket.trim().is_empty() {
            anyhow::bail!("template_bucket must not be empty");
        }
        if self.generated_bucket.trim().is_empty() {
            anyhow::bail!("generated_bucket must not be empty");
        }
        if self.date_format.trim().is_empty() {
            anyhow::bail!("date_format must not be empty");
        }
        if self.max_template_size == 0 {
            anyhow::bail!("max_template_size must be greater than zero");
        }
        Ok(())
    }
}
