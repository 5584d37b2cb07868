//! Registry Configuration
//!
//! Settings shared by a registry and every feed it creates:
//!
//! - **Silent mode**: existence-policy violations become no-ops
//! - **History limit**: how many published items each feed retains
//! - **Failure policy**: what happens when a subscriber callback fails
//!
//! ```rust
//! use feedhub::feeds::config::{FailurePolicy, HistoryLimit, RegistryConfig};
//!
//! let config = RegistryConfig {
//!     silent: true,
//!     history: HistoryLimit::Capped(16),
//!     failure_policy: FailurePolicy::Abort,
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

/// Default number of items retained per feed
pub const DEFAULT_HISTORY_CAPACITY: usize = 1024;

/// Retention policy for a feed's item history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryLimit {
    /// Keep every published item
    Unbounded,
    /// Keep at most this many items, evicting the oldest
    Capped(usize),
    /// Keep nothing beyond live delivery
    Disabled,
}

impl HistoryLimit {
    /// Maximum retained items, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        match self {
            HistoryLimit::Unbounded => None,
            HistoryLimit::Capped(n) => Some(*n),
            HistoryLimit::Disabled => Some(0),
        }
    }
}

impl Default for HistoryLimit {
    fn default() -> Self {
        HistoryLimit::Capped(DEFAULT_HISTORY_CAPACITY)
    }
}

impl std::str::FromStr for HistoryLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unbounded" => Ok(HistoryLimit::Unbounded),
            "disabled" | "none" => Ok(HistoryLimit::Disabled),
            other => other
                .parse::<usize>()
                .map(HistoryLimit::Capped)
                .map_err(|_| format!("Invalid history limit: {}. Valid options: unbounded, disabled, <count>", s)),
        }
    }
}

/// How a publish reacts to failing subscriber callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Notify every subscriber, then report all failures together
    #[default]
    Isolate,
    /// Stop notifying at the first failure
    Abort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "isolate" => Ok(FailurePolicy::Isolate),
            "abort" => Ok(FailurePolicy::Abort),
            _ => Err(format!("Invalid failure policy: {}. Valid options: isolate, abort", s)),
        }
    }
}

/// Registry configuration parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Start in silent mode
    pub silent: bool,
    /// Retention applied to every feed created by the registry
    pub history: HistoryLimit,
    /// Callback failure handling during publish
    pub failure_policy: FailurePolicy,
}

/// Configuration validation error
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("History capacity must be greater than zero (use 'disabled' to keep no history)")]
    ZeroHistoryCapacity,
}

impl RegistryConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history == HistoryLimit::Capped(0) {
            return Err(ConfigError::ZeroHistoryCapacity);
        }

        Ok(())
    }
}
