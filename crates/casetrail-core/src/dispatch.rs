//! Request dispatch: structural validation in front of the orchestrator.

use std::collections::HashSet;
use std::sync::Arc;

use casetrail_protocols::{
    BatchResponse, DispatchRequest, FetchRequestItem, ItemKind, ProgressSink, ReportSink,
};
use tracing::{error, info, warn};
use url::Url;

use crate::error::DispatchError;
use crate::orchestrator::BatchOrchestrator;

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

/// Entry point for fetch-batch and open-report requests.
pub struct Coordinator {
    orchestrator: Arc<BatchOrchestrator>,
    reports: Arc<dyn ReportSink>,
}

impl Coordinator {
    pub fn new(orchestrator: Arc<BatchOrchestrator>, reports: Arc<dyn ReportSink>) -> Self {
        Self {
            orchestrator,
            reports,
        }
    }

    /// Handle one request.
    ///
    /// `origin` is the requesting context, which receives progress. Returns
    /// the response for requests that have one.
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
        origin: Option<&dyn ProgressSink>,
    ) -> Option<BatchResponse> {
        match request {
            DispatchRequest::FetchBatch { items } => Some(self.fetch_batch(&items, origin).await),
            DispatchRequest::OpenReport { html_content } => {
                self.open_report(html_content).await;
                None
            }
        }
    }

    /// Validate and run a batch.
    pub async fn fetch_batch(
        &self,
        items: &[FetchRequestItem],
        origin: Option<&dyn ProgressSink>,
    ) -> BatchResponse {
        let (kind, origin) = match validate(items, origin) {
            Ok(valid) => valid,
            Err(e) => {
                error!("Rejected fetch-batch request: {}", e);
                return BatchResponse::error(e.to_string());
            }
        };
        info!("Accepted {} batch of {} item(s)", kind, items.len());
        let details = self.orchestrator.run(items, kind, origin).await;
        BatchResponse::Success { details }
    }

    /// Hand a finished document to the report sink. Failures are only logged.
    pub async fn open_report(&self, html: String) {
        if html.is_empty() {
            warn!("Ignoring open-report request without content");
            return;
        }
        if let Err(e) = self.reports.open_report(html).await {
            error!("Failed to open report: {}", e);
        }
    }
}

/// Check a batch before any tab is opened. Returns the batch's item kind.
pub fn validate<'a>(
    items: &[FetchRequestItem],
    origin: Option<&'a dyn ProgressSink>,
) -> Result<(ItemKind, &'a dyn ProgressSink), DispatchError> {
    let origin = origin.ok_or(DispatchError::MissingOrigin)?;
    let first = items.first().ok_or(DispatchError::EmptyBatch)?;
    let kind = first.kind;

    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.kind != kind {
            return Err(DispatchError::MixedItemTypes);
        }
        match Url::parse(&item.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(DispatchError::InvalidUrl(item.url.clone())),
        }
        if !seen.insert(item.url.as_str()) {
            return Err(DispatchError::DuplicateUrl(item.url.clone()));
        }
    }
    Ok((kind, origin))
}
