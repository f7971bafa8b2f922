//! `casedoc generate`: produce a document for a case.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{
    load_template, open_store, parse_assignment, print_missing_fields, prompt_for_values,
};
use crate::config::GeneratorConfig;
use crate::pipeline::{GenerationOptions, GenerationOutcome, GenerationPipeline, StepOutcome};

/// Generate a document from a template for one case.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Store directory
    #[arg(long, value_name = "DIR")]
    store: PathBuf,

    /// Case id
    #[arg(long = "case", value_name = "ID")]
    case_id: String,

    /// Template id
    #[arg(long = "template", value_name = "ID")]
    template_id: String,

    /// Value for a missing field; repeatable
    #[arg(long = "set", value_name = "TAG=VALUE", value_parser = parse_assignment)]
    values: Vec<(String, String)>,

    /// Save supplied values back to the case record
    #[arg(long)]
    save: bool,

    /// Do not log the generation in the case's audit trail
    #[arg(long)]
    no_log: bool,

    /// Do not archive the document onto the case
    #[arg(long)]
    no_upload: bool,

    /// Output file; defaults to the generated file name in the current directory
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl GenerateCommand {
    pub async fn execute(self, config: &GeneratorConfig) -> Result<()> {
        let store = open_store(&self.store)?;
        let template = load_template(&store, &self.template_id).await?;

        let mut options = GenerationOptions::from(config);
        options.add_log_entry &= !self.no_log;
        options.upload_to_profile &= !self.no_upload;

        let mut pipeline = GenerationPipeline::from_config(&store, &store, config).with_options(options);
        let outcome = match pipeline.start(Some(&template), Some(&self.case_id)).await? {
            StepOutcome::Completed(outcome) => {
                if !self.values.is_empty() {
                    println!("{}", "No fields were missing; --set values were not used.".yellow());
                }
                outcome
            }
            StepOutcome::AwaitingInput(missing) => {
                let unanswered: Vec<_> = missing
                    .iter()
                    .filter(|field| !self.values.iter().any(|(tag, _)| tag == &field.path))
                    .cloned()
                    .collect();

                let mut values = self.values.clone();
                if !unanswered.is_empty() {
                    match prompt_for_values(&unanswered).await? {
                        Some(prompted) => values.extend(prompted),
                        None => {
                            eprintln!("{}", "Missing values for these fields:".red().bold());
                            print_missing_fields(&unanswered);
                            anyhow::bail!(
                                "{} field(s) have no value; supply them with --set TAG=VALUE",
                                unanswered.len()
                            );
                        }
                    }
                }
                pipeline.resume(&values, self.save).await?
            }
        };

        let path = self.output.clone().unwrap_or_else(|| PathBuf::from(&outcome.file_name));
        tokio::fs::write(&path, &outcome.output)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        report(&outcome, &path);
        Ok(())
    }
}

fn report(outcome: &GenerationOutcome, path: &std::path::Path) {
    println!("{} Generated {}", "✓".green(), path.display());
    if outcome.record_updated {
        println!("  Case record updated with the supplied values");
    }
    if let Some(url) = &outcome.archived_url {
        println!("  Archived to {url}");
    }
    for warning in &outcome.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}
