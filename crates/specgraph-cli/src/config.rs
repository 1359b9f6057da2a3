//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults ([`CheckOptions::default`]).
//! 2. A YAML file: `--config FILE`, or `specgraph.yaml` in the root.
//! 3. Environment: `SPECGRAPH_JOBS`, `SPECGRAPH_STRICT`.
//! 4. Command-line flags.
//!
//! ```yaml
//! exclude: ["drafts/**", "**/CHANGELOG.md"]
//! jobs: 4
//! check_coverage: true
//! authority_conflicts: true
//! topic_key: ancestor
//! conflict_heuristic: modal
//! validate_syntax: true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use specgraph_check::{CheckOptions, HeuristicKind, TopicKey};

use crate::validate::{OutputFormat, ValidateArgs};

/// Config file looked up in the root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "specgraph.yaml";

/// Environment variable overriding the worker count.
pub const ENV_JOBS: &str = "SPECGRAPH_JOBS";

/// Environment variable enabling strict mode.
pub const ENV_STRICT: &str = "SPECGRAPH_STRICT";

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The config file is not valid YAML or has unknown keys.
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// Parser error.
        source: serde_yaml::Error,
    },

    /// An environment variable has an unusable value.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Settings read from a YAML config file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Extra exclude globs.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Worker count.
    pub jobs: Option<usize>,
    /// Promote warnings to errors.
    pub strict: Option<bool>,
    /// Enforce coverage.
    pub check_coverage: Option<bool>,
    /// Run conflict detection.
    pub authority_conflicts: Option<bool>,
    /// Conflict grouping.
    pub topic_key: Option<TopicKey>,
    /// Conflict heuristic.
    pub conflict_heuristic: Option<HeuristicKind>,
    /// Heading slugs satisfy anchors.
    pub implicit_heading_anchors: Option<bool>,
    /// Report catalog-wide syntax gaps.
    pub validate_syntax: Option<bool>,
    /// Report format.
    pub format: Option<OutputFormat>,
}

impl FileConfig {
    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else `specgraph.yaml` in `root` if present,
    /// else defaults.
    ///
    /// # Errors
    ///
    /// Propagates [`FileConfig::load`] failures. A missing explicit file is
    /// an error; a missing default file is not.
    pub fn discover(explicit: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading config file");
            return Self::load(path);
        }
        let default = root.join(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            tracing::debug!(path = %default.display(), "loading config file");
            Self::load(&default)
        } else {
            Ok(Self::default())
        }
    }
}

/// Settings read from the environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// `SPECGRAPH_JOBS`.
    pub jobs: Option<usize>,
    /// `SPECGRAPH_STRICT`.
    pub strict: Option<bool>,
}

impl EnvConfig {
    /// Read the process environment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read variables through `lookup`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jobs = match lookup(ENV_JOBS) {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidEnv {
                        name: ENV_JOBS,
                        value,
                        reason: "expected a positive integer",
                    })?,
            ),
            None => None,
        };
        let strict = match lookup(ENV_STRICT) {
            Some(value) => Some(parse_bool(&value).ok_or(ConfigError::InvalidEnv {
                name: ENV_STRICT,
                value,
                reason: "expected 1/0, true/false, or yes/no",
            })?),
            None => None,
        };
        Ok(Self { jobs, strict })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// The fully layered settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Validation options.
    pub options: CheckOptions,
    /// Report format.
    pub format: OutputFormat,
}

impl Settings {
    /// Merge defaults, file, environment, and flags.
    pub fn layer(file: FileConfig, env: EnvConfig, args: &ValidateArgs) -> Self {
        let mut options = CheckOptions::default();

        options.exclude = file.exclude;
        if let Some(jobs) = file.jobs {
            options.jobs = jobs;
        }
        if let Some(strict) = file.strict {
            options.strict = strict;
        }
        if let Some(check) = file.check_coverage {
            options.check_coverage = check;
        }
        if let Some(conflicts) = file.authority_conflicts {
            options.authority_conflicts = conflicts;
        }
        if let Some(key) = file.topic_key {
            options.topic_key = key;
        }
        if let Some(heuristic) = file.conflict_heuristic {
            options.conflict_heuristic = heuristic;
        }
        if let Some(implicit) = file.implicit_heading_anchors {
            options.implicit_heading_anchors = implicit;
        }
        if let Some(syntax) = file.validate_syntax {
            options.validate_syntax = syntax;
        }
        let mut format = file.format.unwrap_or_default();

        if let Some(jobs) = env.jobs {
            options.jobs = jobs;
        }
        if let Some(strict) = env.strict {
            options.strict = strict;
        }

        options.exclude.extend(args.exclude.iter().cloned());
        if let Some(jobs) = args.jobs {
            options.jobs = jobs;
        }
        options.strict |= args.strict;
        options.check_coverage |= args.check_coverage;
        options.authority_conflicts |= args.authority_conflicts;
        options.validate_syntax |= args.validate_syntax;
        if let Some(key) = args.topic_key {
            options.topic_key = key;
        }
        if let Some(heuristic) = args.conflict_heuristic {
            options.conflict_heuristic = heuristic;
        }
        if args.no_implicit_anchors {
            options.implicit_heading_anchors = false;
        }
        if let Some(f) = args.format {
            format = f;
        }
        options.jobs = options.jobs.max(1);

        Self { options, format }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args() -> ValidateArgs {
        ValidateArgs::default()
    }

    fn env(vars: &[(&str, &str)]) -> Result<EnvConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn file_config_parses_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specgraph.yaml");
        std::fs::write(
            &path,
            "exclude: [\"drafts/**\"]\njobs: 3\nstrict: true\ncheck_coverage: true\nauthority_conflicts: true\ntopic_key: document\nconflict_heuristic: level-gap\nimplicit_heading_anchors: false\nvalidate_syntax: true\nformat: json\n",
        )
        .unwrap();
        let config = FileConfig::load(&path).unwrap();
        assert_eq!(config.exclude, vec!["drafts/**"]);
        assert_eq!(config.jobs, Some(3));
        assert_eq!(config.topic_key, Some(TopicKey::Document));
        assert_eq!(config.conflict_heuristic, Some(HeuristicKind::LevelGap));
        assert_eq!(config.validate_syntax, Some(true));
        assert_eq!(config.format, Some(OutputFormat::Json));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.yaml");
        std::fs::write(&path, "exclude_dirs: [x]\n").unwrap();
        assert!(matches!(
            FileConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn discover_uses_root_default_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(FileConfig::discover(None, dir.path()).unwrap(), FileConfig::default());
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "jobs: 2\n").unwrap();
        assert_eq!(FileConfig::discover(None, dir.path()).unwrap().jobs, Some(2));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(matches!(
            FileConfig::discover(Some(&missing), dir.path()),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn env_values_are_validated() {
        assert_eq!(env(&[("SPECGRAPH_JOBS", "4")]).unwrap().jobs, Some(4));
        assert_eq!(env(&[("SPECGRAPH_STRICT", "yes")]).unwrap().strict, Some(true));
        assert!(env(&[("SPECGRAPH_JOBS", "0")]).is_err());
        assert!(env(&[("SPECGRAPH_JOBS", "many")]).is_err());
        assert!(env(&[("SPECGRAPH_STRICT", "perhaps")]).is_err());
        assert_eq!(env(&[]).unwrap(), EnvConfig::default());
    }

    #[test]
    fn later_layers_win() {
        let file = FileConfig {
            jobs: Some(2),
            strict: Some(false),
            exclude: vec!["drafts".to_string()],
            topic_key: Some(TopicKey::Title),
            ..FileConfig::default()
        };
        let env = EnvConfig {
            jobs: Some(3),
            strict: Some(true),
        };
        let mut cli = args();
        cli.jobs = Some(5);
        cli.exclude = vec!["archive".to_string()];
        cli.topic_key = Some(TopicKey::Anchor);
        cli.no_implicit_anchors = true;

        let settings = Settings::layer(file, env, &cli);
        assert_eq!(settings.options.jobs, 5);
        assert!(settings.options.strict);
        assert_eq!(settings.options.exclude, vec!["drafts", "archive"]);
        assert_eq!(settings.options.topic_key, TopicKey::Anchor);
        assert!(!settings.options.implicit_heading_anchors);
        assert_eq!(settings.format, OutputFormat::Text);
    }

    #[test]
    fn env_overrides_file() {
        let file = FileConfig {
            jobs: Some(2),
            ..FileConfig::default()
        };
        let env = EnvConfig {
            jobs: Some(6),
            strict: None,
        };
        assert_eq!(Settings::layer(file, env, &args()).options.jobs, 6);
    }
}
