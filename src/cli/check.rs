//! `casedoc check`: report the fields a generation would ask for.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{load_template, open_store, print_missing_fields};
use crate::config::GeneratorConfig;
use crate::pipeline::GenerationPipeline;

/// Check a case against a template without generating anything.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Store directory
    #[arg(long, value_name = "DIR")]
    store: PathBuf,

    /// Case id
    #[arg(long = "case", value_name = "ID")]
    case_id: String,

    /// Template id
    #[arg(long = "template", value_name = "ID")]
    template_id: String,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

impl CheckCommand {
    pub async fn execute(self, config: &GeneratorConfig) -> Result<()> {
        let store = open_store(&self.store)?;
        let template = load_template(&store, &self.template_id).await?;

        let mut pipeline = GenerationPipeline::from_config(&store, &store, config);
        let missing = pipeline.check(Some(&template), Some(&self.case_id)).await?;

        if self.format == "json" {
            println!("{}", serde_json::to_string_pretty(&missing)?);
        } else if missing.is_empty() {
            println!("{} All mapped fields of '{}' are filled in.", "✓".green(), template.name);
        } else {
            println!("{} missing field(s) for '{}':", missing.len(), template.name);
            print_missing_fields(&missing);
        }
        Ok(())
    }
}
