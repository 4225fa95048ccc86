//! [`TabHost`] over CDP targets.
//!
//! Each ephemeral tab is a background page target with its own session. A
//! per-tab pump turns the session's CDP events into [`TabUpdate`]s and
//! [`ExtractionResultMessage`]s on the shared buses.

use std::sync::Arc;

use async_trait::async_trait;
use casetrail_protocols::{
    EventBus, ExtractionResultMessage, ResultKind, TabError, TabHost, TabId, TabStatus, TabUpdate,
};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cdp::{BindingCalled, CdpClient, CdpError, CdpResponse, FrameNavigated, PageSession};

#[cfg(test)]
#[path = "tab_host_tests.rs"]
mod tests;

/// Name of the page binding extraction scripts report through.
pub const RESULT_BINDING: &str = "__casetrailResult";

/// What extraction scripts pass to the binding, JSON encoded.
#[derive(Debug, Deserialize)]
struct BindingMessage {
    kind: ResultKind,
    #[serde(default)]
    payload: Value,
}

/// A CDP event translated into host terms.
#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    Update(TabUpdate),
    Result(ExtractionResultMessage),
}

/// Translate one session event of `tab`.
///
/// `last_url` carries the main frame's address between events. Load
/// completion is only reported after a main-frame navigation away from
/// `about:blank`, so the blank page a target starts on never counts as
/// loaded.
pub fn translate(tab: &TabId, event: &CdpResponse, last_url: &mut Option<String>) -> Option<TabEvent> {
    let params = event.params.clone().unwrap_or(Value::Null);

    match event.method.as_deref()? {
        "Page.frameNavigated" => {
            let navigated: FrameNavigated = serde_json::from_value(params).ok()?;
            if !navigated.frame.is_main() || navigated.frame.url.starts_with("about:blank") {
                return None;
            }
            *last_url = Some(navigated.frame.url.clone());
            Some(TabEvent::Update(TabUpdate::new(
                tab.clone(),
                TabStatus::Loading,
                Some(navigated.frame.url),
            )))
        }
        "Page.loadEventFired" => {
            let url = last_url.clone()?;
            Some(TabEvent::Update(TabUpdate::new(
                tab.clone(),
                TabStatus::Complete,
                Some(url),
            )))
        }
        "Runtime.bindingCalled" => {
            let called: BindingCalled = serde_json::from_value(params).ok()?;
            if called.name != RESULT_BINDING {
                return None;
            }
            match serde_json::from_str::<BindingMessage>(&called.payload) {
                Ok(message) => Some(TabEvent::Result(ExtractionResultMessage {
                    kind: message.kind,
                    origin: tab.clone(),
                    payload: message.payload,
                })),
                Err(e) => {
                    warn!("Ignoring malformed result from tab {}: {}", tab, e);
                    None
                }
            }
        }
        _ => None,
    }
}

struct OpenTab {
    session: Arc<PageSession>,
    pump: JoinHandle<()>,
}

/// Opens ephemeral background tabs in a CDP-connected browser.
pub struct CdpTabHost {
    client: Arc<CdpClient>,
    tabs: DashMap<TabId, OpenTab>,
    updates: Arc<EventBus<TabUpdate>>,
    messages: Arc<EventBus<ExtractionResultMessage>>,
}

impl CdpTabHost {
    pub fn new(client: Arc<CdpClient>, channel_capacity: usize) -> Self {
        Self {
            client,
            tabs: DashMap::new(),
            updates: Arc::new(EventBus::new(channel_capacity)),
            messages: Arc::new(EventBus::new(channel_capacity)),
        }
    }

    /// Number of tabs opened and not yet closed.
    pub fn open_count(&self) -> usize {
        self.tabs.len()
    }

    fn session(&self, tab: &TabId) -> Result<Arc<PageSession>, TabError> {
        self.tabs
            .get(tab)
            .map(|entry| entry.session.clone())
            .ok_or_else(|| TabError::NotFound(tab.to_string()))
    }

    /// Attach to a freshly created target, wire its events, then navigate.
    async fn prepare(&self, tab: &TabId, url: &str) -> Result<(), CdpError> {
        let session = Arc::new(self.client.attach(tab.as_str()).await?);
        if let Err(e) = session.add_binding(RESULT_BINDING).await {
            self.client.detach(session.session_id());
            return Err(e);
        }

        let Some(events) = session.take_events() else {
            self.client.detach(session.session_id());
            return Err(CdpError::InvalidResponse(
                "Session events already taken".to_string(),
            ));
        };
        let pump = tokio::spawn(pump(
            tab.clone(),
            events,
            self.updates.clone(),
            self.messages.clone(),
        ));
        self.tabs.insert(
            tab.clone(),
            OpenTab {
                session: session.clone(),
                pump,
            },
        );

        match session.navigate(url).await {
            Ok(()) => Ok(()),
            Err(CdpError::NavigationFailed(reason)) => {
                // Surfaced as a load error rather than an open failure.
                self.updates.publish(TabUpdate::new(
                    tab.clone(),
                    TabStatus::Error(reason),
                    Some(url.to_string()),
                ));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn forget(&self, tab: &TabId) {
        if let Some((_, open)) = self.tabs.remove(tab) {
            self.client.detach(open.session.session_id());
            open.pump.abort();
        }
    }
}

async fn pump(
    tab: TabId,
    mut events: mpsc::UnboundedReceiver<CdpResponse>,
    updates: Arc<EventBus<TabUpdate>>,
    messages: Arc<EventBus<ExtractionResultMessage>>,
) {
    let mut last_url = None;
    while let Some(event) = events.recv().await {
        match translate(&tab, &event, &mut last_url) {
            Some(TabEvent::Update(update)) => {
                updates.publish(update);
            }
            Some(TabEvent::Result(message)) => {
                messages.publish(message);
            }
            None => {}
        }
    }
    debug!("Event pump for tab {} finished", tab);
}

#[async_trait]
impl TabHost for CdpTabHost {
    async fn open_tab(&self, url: &str) -> Result<TabId, TabError> {
        let target_id = self
            .client
            .create_target("about:blank", true)
            .await
            .map_err(|e| TabError::OpenFailed(e.to_string()))?;
        let tab = TabId::new(target_id);

        if let Err(e) = self.prepare(&tab, url).await {
            self.forget(&tab);
            if let Err(close_err) = self.client.close_target(tab.as_str()).await {
                warn!("Failed to close half-opened tab {}: {}", tab, close_err);
            }
            return Err(TabError::OpenFailed(e.to_string()));
        }

        debug!("Opened tab {} for {}", tab, url);
        Ok(tab)
    }

    async fn inject_script(&self, tab: &TabId, source: &str) -> Result<(), TabError> {
        let session = self.session(tab)?;
        session.run_script(source).await.map_err(|e| match e {
            CdpError::SessionClosed => TabError::Disconnected(e.to_string()),
            other => TabError::InjectionFailed(other.to_string()),
        })
    }

    async fn close_tab(&self, tab: &TabId) -> Result<(), TabError> {
        if !self.tabs.contains_key(tab) {
            return Err(TabError::NotFound(tab.to_string()));
        }
        self.forget(tab);
        self.client
            .close_target(tab.as_str())
            .await
            .map_err(|e| TabError::CloseFailed(e.to_string()))
    }

    fn tab_updates(&self) -> Arc<EventBus<TabUpdate>> {
        self.updates.clone()
    }

    fn inbound_messages(&self) -> Arc<EventBus<ExtractionResultMessage>> {
        self.messages.clone()
    }
}
