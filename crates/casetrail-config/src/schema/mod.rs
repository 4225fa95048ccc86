//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod schema_fetch;

pub use schema_fetch::*;

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

pub(crate) fn default_true() -> bool {
    true
}

/// A path under the user's home directory, kept as `~/...` when the home
/// directory is unknown so the loader can still expand it.
fn home_path(relative: &str) -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(relative),
        None => PathBuf::from(format!("~/{}", relative)),
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Browser connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Remote debugging port of the Chrome instance.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    /// Persistent profile, so the record application's session survives restarts.
    #[serde(default = "default_profile_dir")]
    pub profile_dir: PathBuf,

    /// Launch Chrome when nothing listens on `debug_port`.
    #[serde(default = "default_true")]
    pub launch: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            profile_dir: default_profile_dir(),
            launch: default_true(),
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_profile_dir() -> PathBuf {
    home_path(".casetrail/browser-profile")
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Open the finished report in a new browser tab.
    #[serde(default = "default_true")]
    pub open_in_browser: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            open_in_browser: default_true(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Write a daily rotating log file under `log_dir`.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: default_log_dir(),
            file: default_true(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    home_path(".casetrail/logs")
}
