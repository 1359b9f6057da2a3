//! # Validate Subcommand
//!
//! Validates a markdown catalog and prints the report to stdout.
//!
//! Returns exit code: 0 on success (warnings allowed), 1 on validation
//! failure, 2 when validation could not run or was interrupted.
//!
//! ## Interrupts
//!
//! Validation runs on a blocking task of a single-threaded tokio runtime.
//! The runtime races it against Ctrl-C; on interrupt the shared cancel flag
//! stops the extraction workers and no report is printed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Deserialize;

use specgraph_check::{
    CheckError, HeuristicKind, Report, TopicKey, Validator, EXIT_FATAL,
};

use crate::config::{EnvConfig, FileConfig, Settings};

/// How long to wait for workers to notice cancellation before exiting.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Report rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Arguments for the `specgraph validate` subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Repository root to validate (defaults to the current directory).
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Fail when an authority-bearing section has no linked test.
    #[arg(long)]
    pub check_coverage: bool,

    /// Detect conflicting authority-bearing sections.
    #[arg(long)]
    pub authority_conflicts: bool,

    /// Report format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,

    /// Glob of repository-relative paths to skip (repeatable).
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Number of extraction worker threads.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// How sections are grouped for conflict detection
    /// (ancestor, title, document, anchor, keyword).
    #[arg(long, value_name = "KEY")]
    pub topic_key: Option<TopicKey>,

    /// Heuristic for same-topic conflicts (none, modal, level-gap).
    #[arg(long, value_name = "NAME")]
    pub conflict_heuristic: Option<HeuristicKind>,

    /// Do not let GitHub-style heading slugs satisfy link anchors.
    #[arg(long)]
    pub no_implicit_anchors: bool,

    /// Warn when the catalog lacks anchors, authority levels, test
    /// references, or requirement keywords altogether.
    #[arg(long)]
    pub validate_syntax: bool,
}

/// Execute the validate subcommand.
///
/// Returns the process exit code. `Err` means validation could not run.
pub fn run_validate(args: &ValidateArgs, config_path: Option<&Path>) -> Result<u8> {
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };

    let file = FileConfig::discover(config_path, &root).context("failed to load configuration")?;
    let env = EnvConfig::from_env().context("invalid environment configuration")?;
    let settings = Settings::layer(file, env, args);
    tracing::debug!(options = ?settings.options, format = ?settings.format, "resolved settings");

    let cancel = Arc::new(AtomicBool::new(false));
    let validator = Validator::new(&root, settings.options);

    match run_interruptible(validator, Arc::clone(&cancel))? {
        Some(Ok(report)) => {
            print_report(&report, settings.format)?;
            Ok(report.exit_code())
        }
        Some(Err(e)) if e.is_interrupted() => {
            eprintln!("interrupted");
            Ok(EXIT_FATAL)
        }
        Some(Err(e)) => Err(e).with_context(|| format!("cannot validate {}", root.display())),
        None => {
            eprintln!("interrupted");
            Ok(EXIT_FATAL)
        }
    }
}

/// Run the validator on a blocking task, racing Ctrl-C.
///
/// `None` means the run was interrupted before it finished.
fn run_interruptible(
    validator: Validator,
    cancel: Arc<AtomicBool>,
) -> Result<Option<Result<Report, CheckError>>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let outcome = runtime.block_on(async {
        let flag = Arc::clone(&cancel);
        let task = tokio::task::spawn_blocking(move || validator.run(&flag));
        tokio::select! {
            joined = task => Some(joined),
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("interrupt received, cancelling");
                cancel.store(true, Ordering::Relaxed);
                None
            }
        }
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match outcome {
        Some(joined) => Ok(Some(joined.context("validation task panicked")?)),
        None => Ok(None),
    }
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!(
            "{}",
            report.render_json().context("failed to serialize report")?
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgraph_check::{EXIT_INVALID, EXIT_OK};
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn args_for(root: &Path) -> ValidateArgs {
        ValidateArgs {
            root: Some(root.to_path_buf()),
            jobs: Some(2),
            ..ValidateArgs::default()
        }
    }

    #[test]
    fn clean_catalog_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tests/test_cli.py", "def test_help(): pass\n");
        write(
            dir.path(),
            "README.md",
            "## CLI {#cli authority=system}\nMUST print help [^t]\n\n[^t]: tests/test_cli.py\n",
        );
        assert_eq!(run_validate(&args_for(dir.path()), None).unwrap(), EXIT_OK);
    }

    #[test]
    fn broken_link_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "[x](missing.md)\n");
        assert_eq!(run_validate(&args_for(dir.path()), None).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = args_for(&dir.path().join("does-not-exist"));
        assert!(run_validate(&args, None).is_err());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "# Hi\n");
        write(dir.path(), "specgraph.yaml", "bogus_key: 1\n");
        assert!(run_validate(&args_for(dir.path()), None).is_err());
    }

    #[test]
    fn syntax_gaps_fail_only_under_strict() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "# Notes\n\nNothing normative.\n");
        let mut args = args_for(dir.path());
        args.validate_syntax = true;
        assert_eq!(run_validate(&args, None).unwrap(), EXIT_OK);
        args.strict = true;
        assert_eq!(run_validate(&args, None).unwrap(), EXIT_INVALID);
    }

    #[test]
    fn json_format_runs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "# Hi\n");
        let mut args = args_for(dir.path());
        args.format = Some(OutputFormat::Json);
        assert_eq!(run_validate(&args, None).unwrap(), EXIT_OK);
    }
}
