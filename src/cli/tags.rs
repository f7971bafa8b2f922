//! `casedoc tags`: list the tags of a template file.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::templating::{extract, tag_map};

/// List the tags a template uses, or the table of checkable tags.
#[derive(Debug, Args)]
pub struct TagsCommand {
    /// Template file (.docx)
    #[arg(value_name = "TEMPLATE", required_unless_present = "reference")]
    template: Option<PathBuf>,

    /// Print the tags the generator can check against a case record
    #[arg(long, conflicts_with = "template")]
    reference: bool,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

impl TagsCommand {
    pub async fn execute(self) -> Result<()> {
        if self.reference {
            self.print_reference()
        } else if let Some(path) = &self.template {
            self.print_template_tags(path).await
        } else {
            anyhow::bail!("Specify a template file or --reference")
        }
    }

    async fn print_template_tags(&self, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        let mut tags = extract(&bytes)?;
        tags.sort();

        if self.format == "json" {
            let rows: Vec<_> = tags
                .iter()
                .map(|tag| json!({ "tag": tag, "label": tag_map::lookup(tag).map(|e| e.label) }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        if tags.is_empty() {
            println!("{}", "No tags found in template.".yellow());
            return Ok(());
        }
        println!("{} tag(s) in {}:", tags.len(), path.display());
        for tag in &tags {
            match tag_map::lookup(tag) {
                Some(entry) => println!("  {} {}", tag.cyan(), format!("({})", entry.label).dimmed()),
                None => println!("  {tag}"),
            }
        }
        Ok(())
    }

    fn print_reference(&self) -> Result<()> {
        let entries = tag_map::reference();
        if self.format == "json" {
            let rows: Vec<_> = entries
                .iter()
                .map(|e| json!({ "tag": e.tag, "label": e.label, "record_path": e.record_path }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        let width = entries.iter().map(|e| e.tag.len() + 2).max().unwrap_or(0);
        println!("{:<width$}  {}", "TAG".bold(), "FIELD".bold());
        for entry in entries {
            println!("{:<width$}  {}", format!("{{{}}}", entry.tag), entry.label);
        }
        Ok(())
    }
}
