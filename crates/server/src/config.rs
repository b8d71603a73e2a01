// crates/server/src/config.rs
//! Server configuration.
//!
//! Precedence, lowest first: built-in defaults, the optional JSON config file,
//! then environment variables (`DUMMYBOX_*`) and command-line flags.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Paths served by built-in routes; the metrics path may not shadow them.
const RESERVED_PATHS: [&str; 13] = [
    "/delay", "/respond", "/log", "/cpu", "/memory", "/kill", "/jobs", "/env", "/healthz", "/readyz",
    "/version", "/info", "/request",
];

/// Command-line flags. Every flag can also come from the environment.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "dummybox", version, about = "Configurable HTTP test-double server")]
pub struct Cli {
    /// Port to listen on.
    #[arg(long, env = "DUMMYBOX_PORT")]
    pub port: Option<u16>,

    /// Log level: trace, debug, info, warn or error.
    #[arg(long, env = "DUMMYBOX_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Path the Prometheus metrics are served on.
    #[arg(long, env = "DUMMYBOX_METRICS_PATH")]
    pub metrics_path: Option<String>,

    /// Token required on command endpoints. Unset disables authentication.
    #[arg(long, env = "DUMMYBOX_AUTH_TOKEN")]
    pub auth_token: Option<String>,

    /// Record /kill requests instead of exiting.
    #[arg(
        long,
        env = "DUMMYBOX_KILL_DRY_RUN",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub kill_dry_run: Option<bool>,

    /// JSON config file.
    #[arg(long, env = "DUMMYBOX_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid log level {0:?}, expected one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("port must be non-zero")]
    InvalidPort,

    #[error("metrics path must be a literal path starting with '/' and not used by another route: {0:?}")]
    InvalidMetricsPath(String),
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub metrics_path: String,
    pub auth_token: Option<String>,
    pub kill_dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            log_level: "info".to_string(),
            metrics_path: "/metrics".to_string(),
            auth_token: None,
            kill_dry_run: false,
        }
    }
}

impl Config {
    /// Resolve the configuration from flags, environment and config file.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(path) = &cli.metrics_path {
            self.metrics_path = path.clone();
        }
        if let Some(token) = &cli.auth_token {
            self.auth_token = Some(token.clone());
        }
        if let Some(dry_run) = cli.kill_dry_run {
            self.kill_dry_run = dry_run;
        }
        self.log_level = self.log_level.trim().to_ascii_lowercase();
        // An empty token means "no token".
        self.auth_token = self.auth_token.take().filter(|t| !t.is_empty());
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        let path = self.metrics_path.as_str();
        if !path.starts_with('/')
            || path.len() < 2
            || path.contains(&['{', '}', '*', '?', '#', ':'][..])
            || RESERVED_PATHS.contains(&path)
        {
            return Err(ConfigError::InvalidMetricsPath(self.metrics_path.clone()));
        }
        Ok(())
    }

    pub fn auth_enabled(&self) -> bool {
        self.auth_token.is_some()
    }
}
