//! Cache command - inspect the local cache

use super::resolve_targets;
use crate::cache::NamedCache;
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::error::DvcResult;
use crate::report::TracingSink;
use crate::repo::Repo;
use console::style;
use std::path::PathBuf;

/// Execute the cache command
pub async fn execute(args: CacheArgs, repo: &Repo) -> DvcResult<()> {
    match args.action {
        CacheAction::Used { targets, format } => show_used(repo, &targets, format),
        CacheAction::Dir => {
            println!("{}", repo.store().root().display());
            Ok(())
        }
    }
}

/// List the cache entries tracked outputs need
fn show_used(repo: &Repo, targets: &[PathBuf], format: OutputFormat) -> DvcResult<()> {
    let targets = resolve_targets(targets)?;
    let used = repo.used_cache(&targets, &TracingSink)?;

    match format {
        OutputFormat::Table => print_used_table(repo, &used),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&used)?),
        OutputFormat::Plain => print_used_plain(&used),
    }
    Ok(())
}

fn print_used_table(repo: &Repo, used: &NamedCache) {
    if used.is_empty() {
        println!("No cache entries in use.");
        return;
    }

    println!("{:<8} {:<38} {:<8} NAMES", "SCHEME", "CHECKSUM", "STATE");
    println!("{}", "-".repeat(80));

    for scheme in used.schemes() {
        for (checksum, entry) in used.entries(scheme) {
            let state = if !scheme.is_local() {
                style("remote").dim().to_string()
            } else if repo.store().contains(checksum) {
                style("cached").green().to_string()
            } else {
                style("missing").yellow().to_string()
            };

            let names: Vec<&str> = entry.names.iter().map(String::as_str).collect();
            println!(
                "{:<8} {:<38} {:<8} {}",
                scheme.to_string(),
                checksum.to_string(),
                state,
                names.join(", ")
            );
        }
    }
}

fn print_used_plain(used: &NamedCache) {
    for scheme in used.schemes() {
        for checksum in used.scheme_keys(scheme) {
            println!("{}", checksum);
        }
    }
}
