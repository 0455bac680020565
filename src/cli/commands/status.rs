//! Status command - show outputs that differ from their pointer files

use super::resolve_targets;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::error::DvcResult;
use crate::repo::{Repo, StatusEntry};
use console::style;
use std::collections::BTreeMap;

/// Message printed when nothing differs
pub const UP_TO_DATE: &str = "Data and pipelines are up to date.";

/// Execute the status command
pub async fn execute(args: StatusArgs, repo: &Repo) -> DvcResult<()> {
    let targets = resolve_targets(&args.targets)?;
    let entries = repo.status(&targets)?;
    print_status(&entries, args.format)
}

/// Print status entries in the requested format
pub fn print_status(entries: &[StatusEntry], format: OutputFormat) -> DvcResult<()> {
    match format {
        OutputFormat::Table => print_table(entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Plain => {
            for entry in entries {
                println!("{}: {}", entry.state, entry.path);
            }
        }
    }
    Ok(())
}

fn print_table(entries: &[StatusEntry]) {
    if entries.is_empty() {
        println!("{}", UP_TO_DATE);
        return;
    }

    let mut by_stage: BTreeMap<&str, Vec<&StatusEntry>> = BTreeMap::new();
    for entry in entries {
        by_stage.entry(entry.stage.as_str()).or_default().push(entry);
    }

    for (stage, entries) in by_stage {
        println!("{}:", style(stage).bold());
        for entry in entries {
            println!("\t{}", style(format!("{}: {}", entry.state, entry.path)).yellow());
        }
    }
}
