//! Batch fetch configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeouts and URL checks applied to every ephemeral tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Deadline for a tab to finish loading.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,

    /// Deadline for the extraction result after injection.
    #[serde(default = "default_result_timeout")]
    pub result_timeout_secs: u64,

    /// URL fragments that mean the tab was sent to a sign-in page.
    #[serde(default = "default_auth_markers")]
    pub auth_redirect_markers: Vec<String>,

    /// URL fragments that mean the tab landed on an error page.
    #[serde(default = "default_error_markers")]
    pub error_url_markers: Vec<String>,

    /// Buffer size of the tab-update and result buses.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl FetchConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            load_timeout_secs: default_load_timeout(),
            result_timeout_secs: default_result_timeout(),
            auth_redirect_markers: default_auth_markers(),
            error_url_markers: default_error_markers(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_load_timeout() -> u64 {
    30
}

fn default_result_timeout() -> u64 {
    20
}

fn default_auth_markers() -> Vec<String> {
    vec!["login".to_string()]
}

fn default_error_markers() -> Vec<String> {
    vec!["error".to_string()]
}

fn default_channel_capacity() -> usize {
    256
}
