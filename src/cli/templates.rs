//! `casedoc templates`: list available templates.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::open_store;
use crate::catalog::{partition_by_category, sort_and_filter};
use crate::core::DocgenError;
use crate::models::TemplateReference;
use crate::store::RecordStore;

/// List templates, most used first.
#[derive(Debug, Args)]
pub struct TemplatesCommand {
    /// Store directory
    #[arg(long, value_name = "DIR")]
    store: PathBuf,

    /// Only show templates whose name or description contains this text
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,
}

impl TemplatesCommand {
    pub async fn execute(self) -> Result<()> {
        let store = open_store(&self.store)?;
        let templates =
            store.list_templates().await.map_err(|e| DocgenError::store("list_templates", &e))?;

        let shown = sort_and_filter(&templates, self.search.as_deref());
        if shown.is_empty() {
            println!("{}", "No templates found.".yellow());
            return Ok(());
        }

        let (standard, custom) = partition_by_category(shown);
        print_section("Standard templates", &standard);
        print_section("Custom templates", &custom);
        Ok(())
    }
}

fn print_section(title: &str, templates: &[TemplateReference]) {
    if templates.is_empty() {
        return;
    }
    println!("{}", title.bold());
    for template in templates {
        println!(
            "  {} {} {}",
            template.id.cyan(),
            template.name,
            format!("(used {}x)", template.usage_count).dimmed()
        );
        if !template.description.is_empty() {
            println!("      {}", template.description);
        }
    }
    println!();
}
