//! Feed
//!
//! A single topic: its subscriber set, its bounded item history and the
//! synchronous fan-out performed on every publish.

use std::any::{type_name, Any};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use chrono::{DateTime, Utc};
use log::{debug, error};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::feeds::config::{FailurePolicy, HistoryLimit, RegistryConfig};
use crate::feeds::error::{DeliveryFailure, FeedError, FeedResult};
use crate::feeds::item::FeedItem;

/// Subscriber callback invoked with every published item
pub type Callback<T> = Arc<dyn Fn(&FeedItem<T>) -> anyhow::Result<()> + Send + Sync>;

/// Delivery statistics for one feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    /// Total items published
    pub items_published: u64,

    /// Total callback invocations that succeeded
    pub deliveries: u64,

    /// Total callback invocations that returned an error
    pub delivery_failures: u64,

    /// Timestamp of the most recent publish
    pub last_published_at: Option<DateTime<Utc>>,
}

struct Listener<T> {
    name: Arc<str>,
    callback: Callback<T>,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            callback: Arc::clone(&self.callback),
        }
    }
}

struct History<T> {
    items: VecDeque<FeedItem<T>>,
    last_sequence: u64,
}

impl<T> History<T> {
    fn next_item(&mut self, value: T, limit: HistoryLimit) -> FeedItem<T> {
        self.last_sequence += 1;
        let item = FeedItem::new(value, self.last_sequence);

        self.items.push_back(item.clone());
        if let Some(capacity) = limit.capacity() {
            while self.items.len() > capacity {
                self.items.pop_front();
            }
        }

        item
    }
}

/// A named topic carrying values of type `T`
///
/// Callbacks run on the publisher's thread, in the order they were
/// subscribed. A slow callback delays its publisher and nobody else: the
/// subscriber list is snapshotted before dispatch, so callbacks may
/// subscribe, unsubscribe or publish on the same feed.
///
/// Sequence numbers follow publish order, but delivery order does not when
/// publishes overlap: with concurrent or re-entrant publishers a subscriber
/// may receive item #2 before item #1. The item is recorded in the history
/// and counted in [`FeedStats`] before any callback runs, so a panicking
/// callback leaves both in step.
pub struct Feed<T> {
    name: String,
    listeners: RwLock<Vec<Listener<T>>>,
    history: Mutex<History<T>>,
    limit: HistoryLimit,
    failure_policy: FailurePolicy,
    stats: Mutex<FeedStats>,
}

impl<T> Feed<T> {
    /// Create a feed with default retention and failure policy
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &RegistryConfig::default())
    }

    /// Create a feed using the retention and failure policy of `config`
    pub fn with_config(name: impl Into<String>, config: &RegistryConfig) -> Self {
        Self {
            name: name.into(),
            listeners: RwLock::new(Vec::new()),
            history: Mutex::new(History {
                items: VecDeque::new(),
                last_sequence: 0,
            }),
            limit: config.history,
            failure_policy: config.failure_policy,
            stats: Mutex::new(FeedStats::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `callback` under `subscriber`
    ///
    /// Returns `false` without replacing anything when the name is taken.
    pub fn subscribe<F>(&self, subscriber: impl Into<String>, callback: F) -> bool
    where
        F: Fn(&FeedItem<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let subscriber = subscriber.into();
        let mut listeners = self.listeners.write();

        if listeners.iter().any(|l| &*l.name == subscriber.as_str()) {
            debug!("Subscriber '{}' already registered on feed '{}'", subscriber, self.name);
            return false;
        }

        listeners.push(Listener {
            name: Arc::from(subscriber.as_str()),
            callback: Arc::new(callback),
        });
        debug!("Subscribed '{}' to feed '{}'", subscriber, self.name);
        true
    }

    /// Remove the registration for `subscriber`, returning whether one existed
    pub fn unsubscribe(&self, subscriber: &str) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|l| &*l.name != subscriber);

        let removed = listeners.len() != before;
        if removed {
            debug!("Unsubscribed '{}' from feed '{}'", subscriber, self.name);
        }
        removed
    }

    /// Record `value` and deliver it to every subscriber
    ///
    /// The item is kept in the history even when callbacks fail; failures
    /// are reported through [`FeedError::DeliveryFailed`] according to the
    /// feed's [`FailurePolicy`].
    pub fn publish(&self, value: T) -> FeedResult<FeedItem<T>> {
        let item = {
            let mut history = self.history.lock();
            let item = history.next_item(value, self.limit);
            let mut stats = self.stats.lock();
            stats.items_published += 1;
            stats.last_published_at = Some(item.published_at());
            item
        };
        let listeners = self.listeners.read().clone();

        let start_time = Instant::now();
        let mut delivered = 0u64;
        let mut failures = Vec::new();

        for listener in &listeners {
            match (listener.callback)(&item) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    error!(
                        "Subscriber '{}' failed to handle item #{} on feed '{}': {:#}",
                        listener.name, item.sequence(), self.name, e
                    );
                    failures.push(DeliveryFailure {
                        subscriber: listener.name.to_string(),
                        error: format!("{:#}", e),
                    });
                    if self.failure_policy == FailurePolicy::Abort {
                        break;
                    }
                }
            }
        }

        {
            let mut stats = self.stats.lock();
            stats.deliveries += delivered;
            stats.delivery_failures += failures.len() as u64;
        }

        debug!(
            "Published item #{} on feed '{}' to {} subscriber(s) ({} successful, {} failed) in {:?}",
            item.sequence(), self.name, listeners.len(), delivered, failures.len(), start_time.elapsed()
        );

        if failures.is_empty() {
            Ok(item)
        } else {
            Err(FeedError::delivery_failed(self.name.clone(), failures))
        }
    }

    /// Retained items, oldest first
    pub fn history(&self) -> Vec<FeedItem<T>> {
        self.history.lock().items.iter().cloned().collect()
    }

    /// Most recently retained item
    pub fn latest(&self) -> Option<FeedItem<T>> {
        self.history.lock().items.back().cloned()
    }

    /// Number of retained items
    pub fn len(&self) -> usize {
        self.history.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn has_subscriber(&self, subscriber: &str) -> bool {
        self.listeners.read().iter().any(|l| &*l.name == subscriber)
    }

    /// Subscriber names in delivery order
    pub fn subscriber_names(&self) -> Vec<String> {
        self.listeners.read().iter().map(|l| l.name.to_string()).collect()
    }

    pub fn stats(&self) -> FeedStats {
        self.stats.lock().clone()
    }
}

/// Payload-independent view of a feed, as stored by the registry
pub(crate) trait ErasedFeed: Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn payload_type(&self) -> &'static str;
    fn unsubscribe(&self, subscriber: &str) -> bool;
    fn subscriber_names(&self) -> Vec<String>;
    fn len(&self) -> usize;
    fn stats(&self) -> FeedStats;
}

impl<T: Send + Sync + 'static> ErasedFeed for Feed<T> {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn payload_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn unsubscribe(&self, subscriber: &str) -> bool {
        Feed::unsubscribe(self, subscriber)
    }

    fn subscriber_names(&self) -> Vec<String> {
        Feed::subscriber_names(self)
    }

    fn len(&self) -> usize {
        Feed::len(self)
    }

    fn stats(&self) -> FeedStats {
        Feed::stats(self)
    }
}
