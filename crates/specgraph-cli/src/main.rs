//! # specgraph CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use specgraph_check::EXIT_FATAL;
use specgraph_cli::logging;
use specgraph_cli::validate::{run_validate, ValidateArgs};

/// Validator for markdown specification catalogs.
///
/// Checks explicit anchors, authority levels, footnote test links, and
/// internal hyperlinks across every markdown file in a repository.
#[derive(Parser, Debug)]
#[command(name = "specgraph", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (defaults to ROOT/specgraph.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate anchors, test links, authority conflicts, and hyperlinks.
    Validate(ValidateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "specgraph starting");

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args, cli.config.as_deref()),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
