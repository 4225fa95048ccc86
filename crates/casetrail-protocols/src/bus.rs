//! Broadcast event bus with explicit subscriptions.
//!
//! Every subscriber sees every published event; a [`Subscription`] only
//! decides which of them it yields. Nothing is consumed on behalf of other
//! subscribers, so several listeners can watch the same feed for different
//! tabs or message kinds at the same time.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::broadcast;
use tracing::warn;

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

/// Default buffer size for a bus.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// A shared feed of events of one type.
pub struct EventBus<T> {
    sender: broadcast::Sender<T>,
    listeners: Arc<AtomicUsize>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Create a bus buffering at most `capacity` events per slow subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish an event. Returns the number of receivers it was delivered to.
    pub fn publish(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe with a predicate selecting the events this subscriber wants.
    pub fn subscribe<F>(&self, filter: F) -> Subscription<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.listeners.fetch_add(1, Ordering::SeqCst);
        Subscription {
            receiver: self.sender.subscribe(),
            filter: Box::new(filter),
            listeners: self.listeners.clone(),
        }
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

/// A live, filtered view onto an [`EventBus`].
///
/// Dropping the subscription unsubscribes it.
pub struct Subscription<T> {
    receiver: broadcast::Receiver<T>,
    filter: Filter<T>,
    listeners: Arc<AtomicUsize>,
}

impl<T: Clone + Send + 'static> Subscription<T> {
    /// Replace the predicate.
    ///
    /// Events already buffered but not yet read are checked against the new
    /// predicate, so a subscription taken out before an id is known can be
    /// narrowed once it is.
    pub fn retarget<F>(&mut self, filter: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Box::new(filter);
    }

    /// Wait for the next matching event. `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if (self.filter)(&event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscription lagged, {} event(s) dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Unsubscribe explicitly.
    pub fn cancel(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.listeners.fetch_sub(1, Ordering::SeqCst);
    }
}
