//! Ephemeral tab lifecycle: open, wait for load, close on every path.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use casetrail_config::FetchConfig;
use casetrail_protocols::{Subscription, TabHost, TabId, TabStatus, TabUpdate};
use tracing::{debug, warn};

use crate::error::FetchError;

#[cfg(test)]
#[path = "tab_lifecycle_tests.rs"]
mod tests;

/// Lifecycle state of an [`EphemeralTab`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabState {
    Creating,
    Loading,
    Ready,
    /// Extractor injected, its result not yet received.
    AwaitingResult,
    Closed,
}

impl fmt::Display for TabState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TabState::Creating => "creating",
            TabState::Loading => "loading",
            TabState::Ready => "ready",
            TabState::AwaitingResult => "awaiting-result",
            TabState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// URL fragments that turn a load into a failure.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    pub auth_redirect_markers: Vec<String>,
    pub error_url_markers: Vec<String>,
}

impl UrlPolicy {
    fn auth_marker_in(&self, url: &str) -> bool {
        self.auth_redirect_markers.iter().any(|m| url.contains(m.as_str()))
    }

    fn error_marker_in(&self, url: &str) -> bool {
        self.error_url_markers.iter().any(|m| url.contains(m.as_str()))
    }
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for UrlPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            auth_redirect_markers: config.auth_redirect_markers.clone(),
            error_url_markers: config.error_url_markers.clone(),
        }
    }
}

/// One temporary background tab.
///
/// Owned by whoever processes the item. It must be closed with
/// [`EphemeralTab::close`]; a tab dropped while still open is closed in a
/// background task.
pub struct EphemeralTab {
    id: TabId,
    url: String,
    state: TabState,
    load_listener: Option<Subscription<TabUpdate>>,
    host: Arc<dyn TabHost>,
}

impl EphemeralTab {
    pub fn id(&self) -> &TabId {
        &self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> TabState {
        self.state
    }

    pub(crate) fn mark(&mut self, state: TabState) {
        debug!("Tab {} {} -> {}", self.id, self.state, state);
        self.state = state;
    }

    /// Close the tab. Idempotent; host failures are logged and swallowed.
    pub async fn close(&mut self) {
        if self.state == TabState::Closed {
            return;
        }
        self.load_listener = None;
        debug!("Closing tab {} ({})", self.id, self.url);
        if let Err(e) = self.host.close_tab(&self.id).await {
            warn!("Failed to close tab {}: {}", self.id, e);
        }
        self.state = TabState::Closed;
    }
}

impl fmt::Debug for EphemeralTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralTab")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for EphemeralTab {
    fn drop(&mut self) {
        if self.state == TabState::Closed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("Tab {} dropped outside a runtime and left open", self.id);
            return;
        };
        let host = self.host.clone();
        let id = self.id.clone();
        handle.spawn(async move {
            if let Err(e) = host.close_tab(&id).await {
                warn!("Failed to close abandoned tab {}: {}", id, e);
            }
        });
    }
}

/// Opens ephemeral tabs and waits for them to load.
#[derive(Clone)]
pub struct TabLifecycleManager {
    host: Arc<dyn TabHost>,
    policy: UrlPolicy,
}

impl TabLifecycleManager {
    pub fn new(host: Arc<dyn TabHost>, policy: UrlPolicy) -> Self {
        Self { host, policy }
    }

    pub fn host(&self) -> &Arc<dyn TabHost> {
        &self.host
    }

    /// Open an inactive tab for `url`.
    ///
    /// The load listener is attached before the tab exists, so a load that
    /// completes before this returns is still observed.
    pub async fn open(&self, url: &str) -> Result<EphemeralTab, FetchError> {
        let mut listener = self.host.tab_updates().subscribe(|_| false);
        debug!("Opening tab for {}", url);

        let id = self.host.open_tab(url).await.map_err(FetchError::TabOpen)?;

        let target = id.clone();
        listener.retarget(move |update: &TabUpdate| update.tab_id == target);

        let mut tab = EphemeralTab {
            id,
            url: url.to_string(),
            state: TabState::Creating,
            load_listener: Some(listener),
            host: self.host.clone(),
        };
        tab.mark(TabState::Loading);
        Ok(tab)
    }

    /// Wait until the tab reports a completed load.
    ///
    /// Fails on timeout, on a load error, or when the tab ends up on a
    /// sign-in page. The load listener is released on every path.
    pub async fn await_loaded(
        &self,
        tab: &mut EphemeralTab,
        deadline: Duration,
    ) -> Result<(), FetchError> {
        let Some(mut listener) = tab.load_listener.take() else {
            return Err(FetchError::LoadFailed(format!(
                "tab {} is {}, not loading",
                tab.id, tab.state
            )));
        };

        let policy = &self.policy;
        let wait = async {
            loop {
                let Some(update) = listener.next().await else {
                    return Err(FetchError::LoadFailed("tab host went away".to_string()));
                };
                if let Some(outcome) = Self::check_update(policy, &update) {
                    return outcome;
                }
            }
        };

        let result = match tokio::time::timeout(deadline, wait).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::LoadTimeout(deadline)),
        };
        listener.cancel();

        match &result {
            Ok(()) => tab.mark(TabState::Ready),
            Err(e) => debug!("Tab {} did not load: {}", tab.id, e),
        }
        result
    }

    /// Map one update to a terminal outcome, or `None` to keep waiting.
    fn check_update(policy: &UrlPolicy, update: &TabUpdate) -> Option<Result<(), FetchError>> {
        let url = update.url.as_deref().unwrap_or_default();
        if policy.auth_marker_in(url) {
            return Some(Err(FetchError::AuthRedirect(url.to_string())));
        }
        match &update.status {
            TabStatus::Complete => Some(Ok(())),
            TabStatus::Error(reason) => Some(Err(FetchError::LoadFailed(reason.clone()))),
            TabStatus::Loading if policy.error_marker_in(url) => Some(Err(
                FetchError::LoadFailed(format!("navigated to error page {}", url)),
            )),
            TabStatus::Loading => None,
        }
    }

    /// Close the tab. Same as [`EphemeralTab::close`].
    pub async fn close(&self, tab: &mut EphemeralTab) {
        tab.close().await;
    }
}
