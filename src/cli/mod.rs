//! Command-line interface for casedoc.
//!
//! # Commands
//!
//! - `tags` - list the tags of a template file, or the checkable tag table
//! - `check` - report the fields a generation would ask for
//! - `generate` - produce a document for a case
//! - `templates` - list templates, most used first
//!
//! The `check`, `generate` and `templates` commands work on a store directory
//! (see [`crate::store::fs`]).
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: errors only
//! - `--config <path>`: configuration file, also read from `CASEDOC_CONFIG`
//!
//! # Examples
//!
//! ```bash
//! casedoc tags templates/power-of-attorney.docx
//! casedoc check --store ./office --case c-17 --template poa
//! casedoc generate --store ./office --case c-17 --template poa \
//!     --set client.email=jan@example.com --save
//! casedoc templates --store ./office --search residence
//! ```

mod check;
mod common;
mod generate;
mod tags;
mod templates;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::GeneratorConfig;

pub use common::parse_assignment;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`, then `warn`.
    pub log_level: Option<String>,

    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// casedoc: generate case documents from Word templates.
#[derive(Parser)]
#[command(
    name = "casedoc",
    about = "Generate case documents from Word templates",
    version,
    long_about = "casedoc fills .docx templates with data from immigration case records, \
                  asks for fields the record is missing, and can save the answers back."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file (default: ~/.casedoc/config.toml)
    #[arg(short, long, global = true, env = "CASEDOC_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List the tags used by a template
    Tags(tags::TagsCommand),

    /// Show which fields a case is missing for a template
    Check(check::CheckCommand),

    /// Generate a document for a case
    Generate(generate::GenerateCommand),

    /// List available templates
    Templates(templates::TemplatesCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute the command with an explicit [`CliConfig`].
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Tags(cmd) => cmd.execute().await,
            Commands::Check(cmd) => {
                let settings = GeneratorConfig::load_with_optional(config.config_path).await?;
                cmd.execute(&settings).await
            }
            Commands::Generate(cmd) => {
                let settings = GeneratorConfig::load_with_optional(config.config_path).await?;
                cmd.execute(&settings).await
            }
            Commands::Templates(cmd) => cmd.execute().await,
        }
    }
}
