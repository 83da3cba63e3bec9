//! Layered CLI configuration.
//!
//! Defaults, then an optional JSON file (`--config <path>` or
//! `./.luaparse.json`), then command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = ".luaparse.json";

/// Errors the CLI reports before or around parsing.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum CliError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(luaparse::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    #[diagnostic(code(luaparse::config), help("known keys are logLevel, pretty, maxErrors and color"))]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode output")]
    #[diagnostic(code(luaparse::json))]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Default `tracing` filter; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Pretty-print JSON output.
    #[serde(default = "default_true")]
    pub pretty: bool,
    /// Cap on rendered diagnostics per `check` run.
    #[serde(default)]
    pub max_errors: Option<usize>,
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            pretty: true,
            max_errors: None,
            color: true,
        }
    }
}

/// Flag values that override the file layer when set.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub compact: bool,
    pub max_errors: Option<usize>,
    pub no_color: bool,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load the file layer. An explicit path must exist; the default file is
    /// optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    return Ok(Self::default());
                }
                path
            }
        };
        let content = std::fs::read_to_string(&path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).map_err(|source| CliError::Config { path, source })
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if overrides.compact {
            self.pretty = false;
        }
        if overrides.max_errors.is_some() {
            self.max_errors = overrides.max_errors;
        }
        if overrides.no_color {
            self.color = false;
        }
        self
    }
}
