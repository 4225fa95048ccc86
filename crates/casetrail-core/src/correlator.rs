//! Matching extraction results to the tab that produced them.

use std::sync::Arc;
use std::time::Duration;

use casetrail_protocols::{EventBus, ExtractionResultMessage, ResultKind, Subscription, TabId};
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Listens on the shared inbound channel for results of specific tabs.
#[derive(Clone)]
pub struct ResultCorrelator {
    inbound: Arc<EventBus<ExtractionResultMessage>>,
}

impl ResultCorrelator {
    pub fn new(inbound: Arc<EventBus<ExtractionResultMessage>>) -> Self {
        Self { inbound }
    }

    /// Start listening for a `kind` result from `tab`.
    ///
    /// Call before the extraction script is injected so a fast reply is
    /// not lost. Other messages stay visible to other listeners.
    pub fn subscribe(&self, tab: &TabId, kind: ResultKind) -> PendingResult {
        let origin = tab.clone();
        let subscription = self
            .inbound
            .subscribe(move |msg: &ExtractionResultMessage| msg.kind == kind && msg.origin == origin);
        PendingResult {
            subscription,
            tab: tab.clone(),
            kind,
        }
    }

    /// Subscribe and wait in one step.
    pub async fn await_result(
        &self,
        tab: &TabId,
        kind: ResultKind,
        deadline: Duration,
    ) -> Result<Value, FetchError> {
        self.subscribe(tab, kind).wait(deadline).await
    }
}

/// A result not yet received. Resolves at most once.
pub struct PendingResult {
    subscription: Subscription<ExtractionResultMessage>,
    tab: TabId,
    kind: ResultKind,
}

impl PendingResult {
    /// Wait for the matching message. The listener is removed on return.
    pub async fn wait(mut self, deadline: Duration) -> Result<Value, FetchError> {
        let outcome = tokio::time::timeout(deadline, self.subscription.next()).await;
        self.subscription.cancel();
        match outcome {
            Ok(Some(message)) => {
                debug!("Received {:?} from tab {}", self.kind, self.tab);
                Ok(message.payload)
            }
            Ok(None) => Err(FetchError::ChannelClosed),
            Err(_) => Err(FetchError::ResultTimeout(deadline)),
        }
    }

    /// Give up without waiting.
    pub fn cancel(self) {}
}
