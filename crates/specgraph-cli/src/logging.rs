//! Tracing subscriber setup.
//!
//! Logs always go to stderr so stdout carries only the report.

use tracing_subscriber::EnvFilter;

/// Set to `1` to emit JSON log lines.
pub const ENV_LOG_JSON: &str = "SPECGRAPH_LOG_JSON";

/// Filter for a `-v` count: warn, info, debug, then trace.
pub fn filter_for_verbosity(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `-v`.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for_verbosity(verbose));
    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    // A second init (e.g. from tests) keeps the first subscriber.
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}
