//! Progress notification sinks.
//!
//! The orchestrator reports each item before working on it. A sink is only an
//! observer: a failed send is reported back, but never stops a batch.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::ProgressError;
use crate::message::ProgressNotification;

/// Receiver of per-item progress notifications.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn notify(&self, notification: ProgressNotification) -> Result<(), ProgressError>;
}

/// Writes progress to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgressSink;

#[async_trait]
impl ProgressSink for TracingProgressSink {
    async fn notify(&self, n: ProgressNotification) -> Result<(), ProgressError> {
        info!("Fetching {} {}/{}: {}", n.item_type, n.index, n.total, n.url);
        Ok(())
    }
}

/// Forwards progress to a channel owned by the requesting context.
///
/// Sending fails once the receiving half is dropped.
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<ProgressNotification>,
}

impl ChannelProgressSink {
    pub fn new(sender: mpsc::UnboundedSender<ProgressNotification>) -> Self {
        Self { sender }
    }

    /// Create a sink together with its receiving half.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ProgressSink for ChannelProgressSink {
    async fn notify(&self, notification: ProgressNotification) -> Result<(), ProgressError> {
        self.sender
            .send(notification)
            .map_err(|_| ProgressError::ReceiverGone)
    }
}
