//! End-to-end report generation for one record.

use std::sync::Arc;

use casetrail_protocols::{
    BatchResponse, ItemKind, ProgressSink, RecordSource, TimelineItem,
};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::dispatch::Coordinator;
use crate::report::{render_error_document, render_report};
use crate::timeline::{assemble, merge};

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

/// Builds the report for the record shown by a [`RecordSource`].
pub struct ReportJob {
    source: Arc<dyn RecordSource>,
    coordinator: Arc<Coordinator>,
    progress: Arc<dyn ProgressSink>,
}

impl ReportJob {
    pub fn new(
        source: Arc<dyn RecordSource>,
        coordinator: Arc<Coordinator>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            source,
            coordinator,
            progress,
        }
    }

    /// Generate the report and open it.
    pub async fn run(&self) -> String {
        self.run_at(Utc::now()).await
    }

    /// Generate the report stamped with `generated_at` and open it.
    pub async fn run_at(&self, generated_at: DateTime<Utc>) -> String {
        let document = self.generate_at(generated_at).await;
        self.coordinator.open_report(document.clone()).await;
        document
    }

    /// Generate the report document, stamped with `generated_at`.
    ///
    /// Without the record's details section nothing else is attempted and
    /// a minimal error document is returned.
    pub async fn generate_at(&self, generated_at: DateTime<Utc>) -> String {
        let record_url = self.source.record_url().to_string();
        info!("Generating report for {}", record_url);

        let header = match self.source.header().await {
            Ok(Some(header)) => header,
            Ok(None) => {
                error!("Details section not found on {}", record_url);
                return render_error_document(
                    "Extraction Error",
                    "Could not find the main details section on the page. Cannot generate view.",
                );
            }
            Err(e) => {
                error!("Failed to read record header: {}", e);
                return render_error_document(
                    "Error Generating View",
                    &format!("An error occurred while generating the report: {}", e),
                );
            }
        };

        let (notes, emails) = tokio::join!(
            self.collect(ItemKind::Note),
            self.collect(ItemKind::Email)
        );
        info!("Collected {} note(s) and {} email(s)", notes.len(), emails.len());

        let timeline = merge(notes, emails);
        render_report(&header, &timeline, generated_at)
    }

    async fn collect(&self, kind: ItemKind) -> Vec<TimelineItem> {
        let items = match self.source.list_items(kind).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Could not list {} items: {}", kind, e);
                return Vec::new();
            }
        };
        if items.is_empty() {
            info!("No {} items listed", kind);
            return Vec::new();
        }

        match self
            .coordinator
            .fetch_batch(&items, Some(self.progress.as_ref()))
            .await
        {
            BatchResponse::Success { details } => assemble(&items, &details),
            BatchResponse::Error { message } => {
                warn!("{} batch failed: {}", kind, message);
                Vec::new()
            }
        }
    }
}
