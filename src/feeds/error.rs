//! Feed Error Types
//!
//! Structured errors for registry and feed operations.

use thiserror::Error;

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// A single callback failure recorded during fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub subscriber: String,
    pub error: String,
}

impl std::fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subscriber, self.error)
    }
}

/// Errors that can occur in the feed registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Feed name is already registered
    #[error("Feed '{feed}' already exists")]
    AlreadyExists { feed: String },

    /// Feed name is not registered
    #[error("Feed '{feed}' not found")]
    NotFound { feed: String },

    /// Typed operation addressed a feed carrying another payload type
    #[error("Feed '{feed}' carries {actual}, not {expected}")]
    TypeMismatch {
        feed: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// One or more subscribers failed to handle a published item
    #[error("Delivery on feed '{feed}' failed for {} subscriber(s): {}", .failures.len(), join_failures(.failures))]
    DeliveryFailed {
        feed: String,
        failures: Vec<DeliveryFailure>,
    },
}

fn join_failures(failures: &[DeliveryFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FeedError {
    /// Create an already exists error
    pub fn already_exists(feed: impl Into<String>) -> Self {
        Self::AlreadyExists { feed: feed.into() }
    }

    /// Create a not found error
    pub fn not_found(feed: impl Into<String>) -> Self {
        Self::NotFound { feed: feed.into() }
    }

    /// Create a delivery failed error
    pub fn delivery_failed(feed: impl Into<String>, failures: Vec<DeliveryFailure>) -> Self {
        Self::DeliveryFailed {
            feed: feed.into(),
            failures,
        }
    }

    /// Whether silent mode may turn this error into a no-op
    pub fn is_existence_violation(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::NotFound { .. })
    }
}
