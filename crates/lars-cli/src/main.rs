//! # lars CLI entry point
//!
//! Parses arguments, installs logging, connects to the repository named by
//! the environment and dispatches to the subcommand handlers.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lars_client::{HttpBackend, RepositoryConfig};
use lars_resources::{Repository, VanityUrlCache};

use lars_cli::lifecycle::{run_action, run_move, ActionArgs, MoveArgs};
use lars_cli::resource::{
    run_applies, run_delete, run_get, run_list, run_matches, AppliesArgs, DeleteArgs, GetArgs,
    ListArgs, MatchesArgs,
};
use lars_cli::upload::{run_upload, UploadArgs};
use lars_cli::vanity::{run_vanity, VanityArgs};

/// Asset repository client.
///
/// Connection settings are read from LARS_REPOSITORY_URL, LARS_USER,
/// LARS_PASSWORD, LARS_API_KEY and LARS_TIMEOUT_SECS.
#[derive(Parser, Debug)]
#[command(name = "lars", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format on stderr.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a resource descriptor with a reconciliation strategy.
    Upload(UploadArgs),

    /// Drive an asset to a lifecycle state.
    Move(MoveArgs),

    /// Perform a single lifecycle action.
    Action(ActionArgs),

    /// Print an asset as JSON.
    Get(GetArgs),

    /// List assets.
    List(ListArgs),

    /// List stored resources matching a descriptor.
    Matches(MatchesArgs),

    /// Check whether an asset applies to an installed product.
    Applies(AppliesArgs),

    /// Delete an asset and its attachments.
    Delete(DeleteArgs),

    /// Vanity URL lookups and consistency checks.
    Vanity(VanityArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match run(&cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// RUST_LOG wins over `-v` when set.
fn init_tracing(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(command: &Commands) -> Result<u8> {
    let config = RepositoryConfig::from_env().context("repository configuration")?;
    tracing::debug!(url = %config.repository_url, "connecting to repository");
    let backend = HttpBackend::new(&config)?;
    let repo = Repository::new(Arc::new(backend));
    let cache = Arc::new(VanityUrlCache::new());

    match command {
        Commands::Upload(args) => run_upload(args, &repo, &cache),
        Commands::Move(args) => run_move(args, &repo),
        Commands::Action(args) => run_action(args, &repo),
        Commands::Get(args) => run_get(args, &repo),
        Commands::List(args) => run_list(args, &repo),
        Commands::Matches(args) => run_matches(args, &repo),
        Commands::Applies(args) => run_applies(args, &repo),
        Commands::Delete(args) => run_delete(args, &repo),
        Commands::Vanity(args) => run_vanity(args, &repo, &cache),
    }
}
