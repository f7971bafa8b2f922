//! Helpers shared by the CLI commands.

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::DocgenError;
use crate::models::TemplateReference;
use crate::store::{FsStore, RecordStore};
use crate::templating::MissingField;

/// Open the store directory given with `--store`.
pub fn open_store(path: &Path) -> Result<FsStore> {
    FsStore::open(path).with_context(|| format!("Failed to open store at {}", path.display()))
}

/// Fetch a template reference, reporting unknown ids as [`DocgenError::TemplateNotFound`].
pub async fn load_template(store: &FsStore, id: &str) -> Result<TemplateReference> {
    match store.get_template(id).await {
        Ok(template) => Ok(template),
        Err(e) if e.is_not_found() => Err(DocgenError::TemplateNotFound {
            id: id.to_string(),
        }
        .into()),
        Err(e) => Err(DocgenError::store("get_template", &e).into()),
    }
}

/// Parse a `tag=value` argument.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (tag, value) =
        raw.split_once('=').ok_or_else(|| format!("expected TAG=VALUE, got '{raw}'"))?;
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(format!("missing tag name in '{raw}'"));
    }
    Ok((tag.to_string(), value.to_string()))
}

/// Print missing fields as an aligned list.
pub fn print_missing_fields(missing: &[MissingField]) {
    let width = missing.iter().map(|f| f.path.len()).max().unwrap_or(0);
    for field in missing {
        println!("  {:<width$}  {}", field.path.yellow(), field.label);
    }
}

/// Ask the operator for each field that has no value yet.
///
/// Returns `None` when standard input is not a terminal.
pub async fn prompt_for_values(missing: &[MissingField]) -> Result<Option<Vec<(String, String)>>> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }

    println!("{}", "Some fields have no value in the case record:".yellow().bold());
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut values = Vec::with_capacity(missing.len());
    for field in missing {
        print!("{} ", format!("{} ({}):", field.label, field.path).green());
        io::stdout().flush()?;

        let mut line = String::new();
        reader.read_line(&mut line).await.context("Failed to read input")?;
        values.push((field.path.clone(), line.trim_end_matches(['\r', '\n']).to_string()));
    }
    Ok(Some(values))
}
