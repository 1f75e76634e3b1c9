//! Shared, reference-counted fan-out channels keyed by table and row filter.
//!
//! Every consumer interested in the same `(table, filter)` pair shares one
//! broadcast channel. The channel is created by the first subscriber and torn
//! down when the last [`Subscription`] handle is dropped, so an event page
//! opened in many tabs still costs a single upstream channel.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::models::change::RSVP_TABLE;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub table: String,
    pub filter: String,
}

impl SubscriptionKey {
    pub fn new(table: impl Into<String>, filter: impl Into<String>) -> Self {
        Self { table: table.into(), filter: filter.into() }
    }

    pub fn rsvps_for_event(event_id: &str) -> Self {
        Self::new(RSVP_TABLE, format!("event_id=eq.{}", event_id))
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.filter)
    }
}

struct Channel<T> {
    sender: broadcast::Sender<T>,
    subscribers: usize,
}

pub struct SubscriptionManager<T> {
    channels: Mutex<HashMap<SubscriptionKey, Channel<T>>>,
}

impl<T> SubscriptionManager<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Arc<Self> {
        Arc::new(Self { channels: Mutex::new(HashMap::new()) })
    }

    pub fn subscribe(self: &Arc<Self>, key: SubscriptionKey) -> Subscription<T> {
        let mut channels = self.channels.lock();
        let channel = channels.entry(key.clone()).or_insert_with(|| {
            debug!(key = %key, "Opening subscription channel");
            Channel { sender: broadcast::channel(CHANNEL_CAPACITY).0, subscribers: 0 }
        });
        channel.subscribers += 1;

        Subscription {
            receiver: channel.sender.subscribe(),
            key,
            manager: Arc::downgrade(self),
        }
    }

    /// Returns how many subscribers the message reached. Keys nobody listens on are a no-op.
    pub fn publish(&self, key: &SubscriptionKey, message: T) -> usize {
        let channels = self.channels.lock();
        match channels.get(key) {
            Some(channel) => channel.sender.send(message).unwrap_or(0),
            None => 0,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn subscriber_count(&self, key: &SubscriptionKey) -> usize {
        self.channels.lock().get(key).map_or(0, |c| c.subscribers)
    }

    fn release(&self, key: &SubscriptionKey) {
        let mut channels = self.channels.lock();
        if let Some(channel) = channels.get_mut(key) {
            channel.subscribers = channel.subscribers.saturating_sub(1);
            if channel.subscribers == 0 {
                channels.remove(key);
                debug!(key = %key, "Closed subscription channel");
            }
        }
    }
}

/// A live handle on a shared channel; dropping it releases the subscriber slot.
pub struct Subscription<T>
where
    T: Clone + Send + 'static,
{
    key: SubscriptionKey,
    receiver: broadcast::Receiver<T>,
    manager: Weak<SubscriptionManager<T>>,
}

impl<T> Subscription<T>
where
    T: Clone + Send + 'static,
{
    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    /// Next message, or `None` once the channel is gone. Lagging receivers skip ahead.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(key = %self.key, skipped, "Subscriber lagging, skipped messages");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl<T> Drop for Subscription<T>
where
    T: Clone + Send + 'static,
{
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.release(&self.key);
        }
    }
}
