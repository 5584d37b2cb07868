//! Feed Items
//!
//! One published value together with when it was published.

use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, Utc};

/// An immutable published value
///
/// The payload is shared between the feed history and every notified
/// subscriber, so cloning an item never copies the value itself.
pub struct FeedItem<T> {
    value: Arc<T>,
    published_at: DateTime<Utc>,
    sequence: u64,
}

impl<T> FeedItem<T> {
    pub(crate) fn new(value: T, sequence: u64) -> Self {
        Self {
            value: Arc::new(value),
            published_at: Utc::now(),
            sequence,
        }
    }

    /// The published value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Shared handle to the published value
    pub fn shared_value(&self) -> Arc<T> {
        Arc::clone(&self.value)
    }

    /// When the value was published
    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    /// Position of this item within its feed, starting at 1
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<T> Clone for FeedItem<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            published_at: self.published_at,
            sequence: self.sequence,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FeedItem<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedItem")
            .field("value", &self.value)
            .field("published_at", &self.published_at)
            .field("sequence", &self.sequence)
            .finish()
    }
}
