//! In-Process Feed Registry
//!
//! Named feeds to which typed values are published, and against which named
//! subscribers register callbacks receiving every subsequently published
//! value.
//!
//! # Architecture
//!
//! - **Registry**: owns the feed namespace and enforces the existence policy
//! - **Feed**: one topic's subscribers and bounded item history
//! - **FeedItem**: a published value plus its timestamp and sequence number
//!
//! Delivery is synchronous: `publish` runs every callback on the caller's
//! thread, in subscription order, before returning.
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use feedhub::feeds::{FeedError, Registry};
//!
//! # fn main() -> Result<(), FeedError> {
//! let registry = Registry::new();
//! registry.create_feed::<i32>("myIntegerFeed", false)?;
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! registry.subscribe_to::<i32, _>("myIntegerFeed", "s1", move |item| {
//!     sink.lock().unwrap().push(*item.value());
//!     Ok(())
//! })?;
//!
//! registry.publish("myIntegerFeed", 5)?;
//! registry.unsubscribe_to("myIntegerFeed", "s1")?;
//! registry.publish("myIntegerFeed", 3)?;
//!
//! assert_eq!(*seen.lock().unwrap(), vec![5]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod item;
pub mod registry;


// Re-export core types for convenience
pub use config::{FailurePolicy, HistoryLimit, RegistryConfig};
pub use error::{DeliveryFailure, FeedError, FeedResult};
pub use feed::{Callback, Feed, FeedStats};
pub use item::FeedItem;
pub use registry::{global, Registry};
