//! CLI argument definitions for the Casebook application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Casebook — a local-first chat workspace for estimate work.
#[derive(Parser, Debug)]
#[command(name = "casebook", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory holding the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CASEBOOK_CONFIG env var > platform default
    /// (~/.casebook/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CASEBOOK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory.
    ///
    /// Priority: --data-dir flag > CASEBOOK_DATA_DIR env var > config value.
    pub fn resolve_data_dir(&self, config_dir: &str) -> PathBuf {
        if let Some(ref p) = self.data_dir {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CASEBOOK_DATA_DIR") {
            return PathBuf::from(p);
        }
        expand_home(config_dir)
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > RUST_LOG env var (handled by the
    /// subscriber) > config value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        config_level.to_string()
    }
}

fn default_config_path() -> PathBuf {
    expand_home("~/.casebook").join("config.toml")
}

/// Expand a leading `~/` against $HOME; paths without it pass through.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    } else if path == "~" {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home);
        }
    }
    PathBuf::from(path)
}
