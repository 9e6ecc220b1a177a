//! Consumer registrations on host streams.

use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

type Release = Box<dyn FnOnce() + Send>;

/// A registered consumer of a host stream.
///
/// Values arrive in publication order. Dropping the subscription unregisters
/// the consumer, so ending the owning task ends the subscription.
pub struct Subscription<T> {
    /// Consumer identifier
    id: Uuid,
    /// Incoming values
    rx: UnboundedReceiver<T>,
    /// Unregisters the consumer from its source
    release: Option<Release>,
}

impl<T> Subscription<T> {
    /// Create a subscription that calls `release` when dropped.
    pub fn new(id: Uuid, rx: UnboundedReceiver<T>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            rx,
            release: Some(Box::new(release)),
        }
    }

    /// Wait for the next value. Returns `None` once the source is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take the next value if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain everything queued and return the most recent value.
    pub fn latest(&mut self) -> Option<T> {
        let mut latest = None;
        while let Some(value) = self.try_recv() {
            latest = Some(value);
        }
        latest
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Fan-out of a single stream to its consumers.
///
/// Remembers the last published value and replays it to new consumers.
pub struct Topic<T> {
    consumers: HashMap<Uuid, UnboundedSender<T>>,
    last: Option<T>,
}

impl<T> Default for Topic<T> {
    fn default() -> Self {
        Self {
            consumers: HashMap::new(),
            last: None,
        }
    }
}

impl<T: Clone> Topic<T> {
    /// Register a consumer.
    pub fn add(&mut self) -> (Uuid, UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(last) = &self.last {
            let _ = tx.send(last.clone());
        }
        let id = Uuid::new_v4();
        self.consumers.insert(id, tx);
        (id, rx)
    }

    /// Unregister a consumer.
    pub fn remove(&mut self, id: Uuid) {
        self.consumers.remove(&id);
    }

    /// Send a value to every consumer and remember it.
    pub fn publish(&mut self, value: T) {
        self.consumers.retain(|_, tx| tx.send(value.clone()).is_ok());
        self.last = Some(value);
    }

    /// Last published value.
    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }
}
