//! Finding, launching and connecting to Chrome.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use casetrail_config::BrowserConfig;
use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::cdp::CdpClient;
use crate::error::BrowserError;

/// Attempts to reach the debugging endpoint after a launch.
const STARTUP_ATTEMPTS: u32 = 30;
const STARTUP_POLL: Duration = Duration::from_millis(200);

/// Brings up a Chrome instance with remote debugging on the configured port.
pub struct BrowserLauncher {
    config: BrowserConfig,
    /// Chrome process handle, if this launcher started it.
    child: Mutex<Option<Child>>,
}

impl BrowserLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
        }
    }

    /// HTTP debugging endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.config.debug_port)
    }

    /// Find Chrome executable path.
    pub fn find_chrome() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        ];

        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).find(|p| p.exists())
    }

    /// Check if something answers on the debugging endpoint.
    pub async fn is_running(&self) -> bool {
        reqwest::get(format!("{}/json/version", self.endpoint()))
            .await
            .is_ok()
    }

    fn spawn_chrome(&self) -> Result<Child, BrowserError> {
        let chrome_path = Self::find_chrome().ok_or(BrowserError::ChromeNotFound)?;
        let profile_dir = &self.config.profile_dir;

        if let Err(e) = std::fs::create_dir_all(profile_dir) {
            warn!("Failed to create profile directory: {}", e);
        }

        info!("Launching Chrome with profile at: {}", profile_dir.display());

        let mut cmd = Command::new(&chrome_path);
        cmd.arg(format!("--remote-debugging-port={}", self.config.debug_port))
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if self.config.headless {
            cmd.arg("--headless=new");
        }

        let child = cmd
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Make sure a browser listens on the endpoint, launching one when
    /// allowed.
    pub async fn ensure_running(&self) -> Result<(), BrowserError> {
        if self.is_running().await {
            info!("Chrome already running on port {}", self.config.debug_port);
            return Ok(());
        }

        if !self.config.launch {
            return Err(BrowserError::NotRunning(self.endpoint()));
        }

        info!(
            "Chrome not running on port {}, launching...",
            self.config.debug_port
        );
        let child = self.spawn_chrome()?;
        *self.child.lock() = Some(child);

        for _ in 0..STARTUP_ATTEMPTS {
            tokio::time::sleep(STARTUP_POLL).await;
            if self.is_running().await {
                return Ok(());
            }
        }

        Err(BrowserError::LaunchFailed(
            "Chrome failed to start within timeout".to_string(),
        ))
    }

    /// Ensure the browser runs and open a CDP connection to it.
    pub async fn connect(&self) -> Result<CdpClient, BrowserError> {
        self.ensure_running().await?;
        let client = CdpClient::connect(&self.endpoint()).await?;
        info!("Connected to Chrome at {}", self.endpoint());
        Ok(client)
    }

    /// Whether this launcher started the running browser.
    pub fn launched(&self) -> bool {
        self.child.lock().is_some()
    }

    /// Kill Chrome if this launcher started it.
    pub async fn shutdown(&self) {
        let child = self.child.lock().take();
        if let Some(mut child) = child {
            info!("Shutting down Chrome...");
            if let Err(e) = child.kill().await {
                warn!("Failed to stop Chrome: {}", e);
            }
        }
    }
}
