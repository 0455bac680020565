//! dvc - data version control
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use dvc::cli::{commands, Cli, Commands};
use dvc::config::ConfigManager;
use dvc::error::{DvcError, DvcResult};
use dvc::repo::Repo;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DvcResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("dvc=warn"),
        1 => EnvFilter::new("dvc=info"),
        _ => EnvFilter::new("dvc=debug"),
    };

    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Init command doesn't need an existing repository
    if let Commands::Init(args) = cli.command {
        return commands::init(args).await;
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let cwd = std::env::current_dir().map_err(|e| DvcError::io("getting current directory", e))?;
    let root = Repo::find(&cwd);
    if let Ok(ref root) = root {
        debug!("Repository root: {}", root.display());
    }

    let config = config_manager.load_merged(root.as_deref().ok()).await?;

    // Config command works outside a repository
    if let Commands::Config(args) = cli.command {
        return commands::config(args, &config_manager, &config, root.as_deref().ok()).await;
    }

    let repo = Repo::open(root?, config);

    // Dispatch to command
    match cli.command {
        Commands::Init(_) | Commands::Config(_) => unreachable!("handled above"),
        Commands::Add(args) => commands::add(args, &repo).await,
        Commands::Commit(args) => commands::commit(args, &repo).await,
        Commands::Checkout(args) => commands::checkout(args, &repo).await,
        Commands::Status(args) => commands::status(args, &repo).await,
        Commands::Push(args) => commands::push(args, &repo).await,
        Commands::Install => commands::install(&repo).await,
        Commands::GitHook(args) => commands::git_hook(args, &repo).await,
        Commands::Cache(args) => commands::cache(args, &repo).await,
    }
}
