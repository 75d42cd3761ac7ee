//! Check command - Compile every template in a directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use stencil_templates::{CheckResult, TemplateRepository, DEFAULT_EXTENSION};

#[derive(Args)]
pub struct CheckArgs {
    /// Templates directory
    dir: PathBuf,

    /// Template file extension
    #[arg(short, long, default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

/// One line of the report.
#[derive(Debug, Serialize)]
struct CheckEntry {
    name: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<&CheckResult> for CheckEntry {
    fn from(result: &CheckResult) -> Self {
        Self {
            name: result.name.clone(),
            ok: result.is_ok(),
            error: result.error.as_ref().map(ToString::to_string),
        }
    }
}

pub fn execute(args: CheckArgs) -> Result<()> {
    info!("Checking templates in {:?}", args.dir);

    if !args.dir.is_dir() {
        anyhow::bail!("Templates directory not found: {:?}", args.dir);
    }

    let repository = TemplateRepository::from_directory(&args.dir, args.extension.as_str());
    let results = repository.check_all().context("Failed to list templates")?;
    let entries: Vec<CheckEntry> = results.iter().map(CheckEntry::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_report(&entries);
    }

    let total = results.len();
    match results.into_iter().find_map(|result| result.error) {
        Some(first) => {
            let failed = entries.iter().filter(|entry| !entry.ok).count();
            Err(anyhow::Error::new(first)
                .context(format!("{} of {} templates failed to compile", failed, total)))
        }
        None => Ok(()),
    }
}

fn print_report(entries: &[CheckEntry]) {
    if entries.is_empty() {
        println!("No templates found");
        return;
    }

    println!("Checking {} template(s)...\n", entries.len());
    for entry in entries {
        match &entry.error {
            None => println!("  ok    {}", entry.name),
            Some(error) => {
                println!("  FAIL  {}", entry.name);
                println!("        {}", error);
            }
        }
    }

    let failed = entries.iter().filter(|entry| !entry.ok).count();
    println!();
    println!("Results: {} passed, {} failed", entries.len() - failed, failed);
}
