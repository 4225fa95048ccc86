//! Scriptable in-memory tab host.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use casetrail_protocols::{
    EventBus, ExtractionResultMessage, FetchRequestItem, HeaderRecord, ItemKind, ProgressError,
    ProgressNotification, ProgressSink, RecordSource, ReportError, ReportSink, ResultKind,
    SourceError, TabError, TabHost, TabId, TabStatus, TabUpdate,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// How a scripted tab loads.
#[derive(Debug, Clone)]
pub enum Load {
    /// `Loading` then `Complete` on the requested URL.
    Complete,
    /// Like `Complete`, but only after the given delay.
    CompleteAfter(Duration),
    /// Never reaches a terminal state.
    Hang,
    /// Reports a load error.
    Error(String),
    /// Lands on another URL, then completes there.
    RedirectTo(String),
    /// `open_tab` itself fails.
    OpenFails,
}

/// What a scripted tab posts once its extraction script runs.
#[derive(Debug, Clone)]
pub enum Extract {
    Reply(Value),
    /// Posts the reply only after the given delay.
    ReplyAfter(Duration, Value),
    /// Posts a reply of the other kind, then nothing.
    WrongKind,
    /// Posts nothing.
    Silent,
    /// `inject_script` fails.
    InjectFails,
}

#[derive(Debug, Clone)]
pub struct Script {
    pub load: Load,
    pub extract: Extract,
}

impl Script {
    pub fn ok(payload: Value) -> Self {
        Self {
            load: Load::Complete,
            extract: Extract::Reply(payload),
        }
    }

    pub fn load(load: Load) -> Self {
        Self {
            load,
            extract: Extract::Reply(json!({})),
        }
    }

    pub fn extract(extract: Extract) -> Self {
        Self {
            load: Load::Complete,
            extract,
        }
    }
}

pub struct FakeTabHost {
    updates: Arc<EventBus<TabUpdate>>,
    messages: Arc<EventBus<ExtractionResultMessage>>,
    scripts: Mutex<HashMap<String, Script>>,
    tabs: Mutex<HashMap<TabId, String>>,
    journal: Arc<Mutex<Vec<String>>>,
    next_id: AtomicU64,
    pub opens: AtomicUsize,
    pub injects: AtomicUsize,
    pub closes: AtomicUsize,
    pub fail_close: bool,
}

impl FakeTabHost {
    pub fn new() -> Self {
        Self {
            updates: Arc::new(EventBus::new(64)),
            messages: Arc::new(EventBus::new(64)),
            scripts: Mutex::new(HashMap::new()),
            tabs: Mutex::new(HashMap::new()),
            journal: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            opens: AtomicUsize::new(0),
            injects: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fail_close: false,
        }
    }

    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn script(&self, url: &str, script: Script) {
        self.scripts.lock().insert(url.to_string(), script);
    }

    /// Ordered log of `open:`, `inject:` and `close:` calls by URL.
    pub fn journal(&self) -> Arc<Mutex<Vec<String>>> {
        self.journal.clone()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn injects(&self) -> usize {
        self.injects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Publish an extraction result as if a page had posted it.
    pub fn post(&self, tab: &TabId, kind: ResultKind, payload: Value) {
        self.messages.publish(ExtractionResultMessage {
            kind,
            origin: tab.clone(),
            payload,
        });
    }

    fn script_for(&self, url: &str) -> Script {
        self.scripts
            .lock()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Script::ok(json!({})))
    }

    fn url_of(&self, tab: &TabId) -> Option<String> {
        self.tabs.lock().get(tab).cloned()
    }

}

fn spawn_after(delay: Duration, event: impl FnOnce() + Send + 'static) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        event();
    });
}

#[async_trait]
impl TabHost for FakeTabHost {
    async fn open_tab(&self, url: &str) -> Result<TabId, TabError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push(format!("open:{}", url));

        let script = self.script_for(url);
        if let Load::OpenFails = script.load {
            return Err(TabError::OpenFailed("scripted".to_string()));
        }

        let id = TabId::new(format!("tab-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.tabs.lock().insert(id.clone(), url.to_string());

        let update = |status: TabStatus, at: &str| TabUpdate::new(id.clone(), status, Some(at.to_string()));
        match script.load {
            // Published before the id is returned: listeners must already be in place.
            Load::Complete => {
                self.updates.publish(update(TabStatus::Loading, url));
                self.updates.publish(update(TabStatus::Complete, url));
            }
            Load::CompleteAfter(delay) => {
                self.updates.publish(update(TabStatus::Loading, url));
                let bus = self.updates.clone();
                let done = update(TabStatus::Complete, url);
                spawn_after(delay, move || {
                    bus.publish(done);
                });
            }
            Load::Hang => {
                self.updates.publish(update(TabStatus::Loading, url));
            }
            Load::Error(reason) => {
                self.updates.publish(update(TabStatus::Error(reason), url));
            }
            Load::RedirectTo(target) => {
                self.updates.publish(update(TabStatus::Loading, url));
                self.updates.publish(update(TabStatus::Loading, &target));
                self.updates.publish(update(TabStatus::Complete, &target));
            }
            Load::OpenFails => {}
        }
        Ok(id)
    }

    async fn inject_script(&self, tab: &TabId, source: &str) -> Result<(), TabError> {
        self.injects.fetch_add(1, Ordering::SeqCst);
        let url = self
            .url_of(tab)
            .ok_or_else(|| TabError::NotFound(tab.to_string()))?;
        self.journal.lock().push(format!("inject:{}", url));

        let kind = if source.contains("email") {
            ResultKind::EmailResult
        } else {
            ResultKind::NoteResult
        };
        let other = match kind {
            ResultKind::NoteResult => ResultKind::EmailResult,
            ResultKind::EmailResult => ResultKind::NoteResult,
        };

        match self.script_for(&url).extract {
            Extract::Reply(payload) => self.post(tab, kind, payload),
            Extract::ReplyAfter(delay, payload) => {
                let bus = self.messages.clone();
                let message = ExtractionResultMessage {
                    kind,
                    origin: tab.clone(),
                    payload,
                };
                spawn_after(delay, move || {
                    bus.publish(message);
                });
            }
            Extract::WrongKind => self.post(tab, other, json!({})),
            Extract::Silent => {}
            Extract::InjectFails => {
                return Err(TabError::InjectionFailed("scripted".to_string()));
            }
        }
        Ok(())
    }

    async fn close_tab(&self, tab: &TabId) -> Result<(), TabError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        let url = self.url_of(tab).unwrap_or_else(|| tab.to_string());
        self.journal.lock().push(format!("close:{}", url));
        if self.fail_close {
            return Err(TabError::CloseFailed("scripted".to_string()));
        }
        Ok(())
    }

    fn tab_updates(&self) -> Arc<EventBus<TabUpdate>> {
        self.updates.clone()
    }

    fn inbound_messages(&self) -> Arc<EventBus<ExtractionResultMessage>> {
        self.messages.clone()
    }
}

/// Progress sink writing into a host's journal.
pub struct JournalProgressSink {
    journal: Arc<Mutex<Vec<String>>>,
    pub received: Mutex<Vec<ProgressNotification>>,
    pub fail: bool,
}

impl JournalProgressSink {
    pub fn new(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            journal,
            received: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            fail: true,
            ..Self::new(journal)
        }
    }
}

#[async_trait]
impl ProgressSink for JournalProgressSink {
    async fn notify(&self, n: ProgressNotification) -> Result<(), ProgressError> {
        self.journal.lock().push(format!("progress:{}/{}", n.index, n.total));
        self.received.lock().push(n);
        if self.fail {
            return Err(ProgressError::ReceiverGone);
        }
        Ok(())
    }
}

/// Report sink that keeps every document it is given.
#[derive(Default)]
pub struct RecordingReportSink {
    pub opened: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl ReportSink for RecordingReportSink {
    async fn open_report(&self, html: String) -> Result<(), ReportError> {
        self.opened.lock().push(html);
        if self.fail {
            return Err(ReportError::OpenFailed("scripted".to_string()));
        }
        Ok(())
    }
}

/// Record page with a fixed header and listings.
pub struct StaticRecordSource {
    pub url: String,
    pub header: Option<HeaderRecord>,
    pub notes: Result<Vec<FetchRequestItem>, String>,
    pub emails: Result<Vec<FetchRequestItem>, String>,
    pub listed: AtomicUsize,
}

impl StaticRecordSource {
    pub fn new(header: Option<HeaderRecord>) -> Self {
        Self {
            url: "https://x/lightning/r/Case/500/view".to_string(),
            header,
            notes: Ok(Vec::new()),
            emails: Ok(Vec::new()),
            listed: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    fn record_url(&self) -> &str {
        &self.url
    }

    async fn header(&self) -> Result<Option<HeaderRecord>, SourceError> {
        Ok(self.header.clone())
    }

    async fn list_items(&self, kind: ItemKind) -> Result<Vec<FetchRequestItem>, SourceError> {
        self.listed.fetch_add(1, Ordering::SeqCst);
        let listing = match kind {
            ItemKind::Note => &self.notes,
            ItemKind::Email => &self.emails,
        };
        listing.clone().map_err(SourceError::ScriptFailed)
    }
}
