//! Sequential batch processing of related items through ephemeral tabs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use casetrail_config::FetchConfig;
use casetrail_protocols::{
    EmailPayload, ExtractionPayload, ExtractorSet, FetchRequestItem, FetchedDetail, ItemKind,
    NotePayload, ProgressNotification, ProgressSink, ResultKind, TabHost,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::correlator::ResultCorrelator;
use crate::date::parse_date;
use crate::error::FetchError;
use crate::tab_lifecycle::{EphemeralTab, TabLifecycleManager, TabState, UrlPolicy};

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

/// Drives one batch of same-kind items, one tab at a time.
pub struct BatchOrchestrator {
    tabs: TabLifecycleManager,
    correlator: ResultCorrelator,
    extractors: ExtractorSet,
    load_timeout: Duration,
    result_timeout: Duration,
}

impl BatchOrchestrator {
    pub fn new(host: Arc<dyn TabHost>, extractors: ExtractorSet, config: &FetchConfig) -> Self {
        let correlator = ResultCorrelator::new(host.inbound_messages());
        Self {
            tabs: TabLifecycleManager::new(host, UrlPolicy::from(config)),
            correlator,
            extractors,
            load_timeout: config.load_timeout(),
            result_timeout: config.result_timeout(),
        }
    }

    /// Process every item and return one outcome per URL.
    ///
    /// Items run strictly in order; the next tab is opened only after the
    /// previous one was closed. A failing item becomes a `Failed` entry and
    /// never stops the batch.
    pub async fn run(
        &self,
        items: &[FetchRequestItem],
        kind: ItemKind,
        progress: &dyn ProgressSink,
    ) -> HashMap<String, FetchedDetail> {
        let total = items.len();
        info!("Starting {} batch of {} item(s)", kind, total);

        let mut results = HashMap::with_capacity(total);
        let mut failures = 0usize;

        for (i, item) in items.iter().enumerate() {
            let notification = ProgressNotification {
                url: item.url.clone(),
                item_type: kind,
                index: i + 1,
                total,
            };
            if let Err(e) = progress.notify(notification).await {
                warn!("Progress notification for {} not delivered: {}", item.url, e);
            }

            debug!("Processing {} {}/{}: {}", kind, i + 1, total, item.url);
            let date_object = parse_date(&item.date_str);
            let detail = match self.fetch_one(item, kind).await {
                Ok(payload) => FetchedDetail::Fetched {
                    payload,
                    date_object,
                },
                Err(e) => {
                    warn!("{} {} failed: {}", kind, item.url, e);
                    failures += 1;
                    FetchedDetail::Failed {
                        reason: e.to_string(),
                        date_object,
                    }
                }
            };
            results.insert(item.url.clone(), detail);
        }

        info!(
            "Finished {} batch: {} fetched, {} failed",
            kind,
            total - failures,
            failures
        );
        results
    }

    async fn fetch_one(
        &self,
        item: &FetchRequestItem,
        kind: ItemKind,
    ) -> Result<ExtractionPayload, FetchError> {
        let mut tab = self.tabs.open(&item.url).await?;
        let outcome = self.extract(&mut tab, kind).await;
        self.tabs.close(&mut tab).await;
        outcome
    }

    async fn extract(
        &self,
        tab: &mut EphemeralTab,
        kind: ItemKind,
    ) -> Result<ExtractionPayload, FetchError> {
        self.tabs.await_loaded(tab, self.load_timeout).await?;

        let pending = self.correlator.subscribe(tab.id(), ResultKind::from(kind));
        let script = self.extractors.for_kind(kind);
        self.tabs
            .host()
            .inject_script(tab.id(), &script.source)
            .await
            .map_err(FetchError::Injection)?;
        tab.mark(TabState::AwaitingResult);
        let value = pending.wait(self.result_timeout).await?;
        normalize(kind, value)
    }
}

/// Turn a raw extraction message payload into the typed payload for `kind`.
pub fn normalize(kind: ItemKind, value: Value) -> Result<ExtractionPayload, FetchError> {
    if let Some(reason) = value.get("error").and_then(Value::as_str) {
        return Err(FetchError::ExtractorFailed(reason.to_string()));
    }
    let payload = match kind {
        ItemKind::Note => serde_json::from_value::<NotePayload>(value).map(ExtractionPayload::Note),
        ItemKind::Email => {
            serde_json::from_value::<EmailPayload>(value).map(ExtractionPayload::Email)
        }
    };
    payload.map_err(|e| FetchError::MalformedResult(e.to_string()))
}
