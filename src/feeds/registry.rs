//! Feed Registry
//!
//! Owns the feed namespace and forwards subscribe, unsubscribe and publish
//! calls to the addressed feed, enforcing the existence policy uniformly.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::config::ConfigManager;
use crate::feeds::config::RegistryConfig;
use crate::feeds::error::{FeedError, FeedResult};
use crate::feeds::feed::{ErasedFeed, Feed, FeedStats};
use crate::feeds::item::FeedItem;

/// Registry of named feeds
///
/// Feeds of different payload types live side by side; every typed call
/// checks that the addressed feed carries the requested type and fails with
/// [`FeedError::TypeMismatch`] otherwise.
///
/// In silent mode, create, remove, subscribe, unsubscribe and publish
/// swallow [`FeedError::AlreadyExists`] and [`FeedError::NotFound`] and
/// report that they did nothing (`false` or `None`). Other errors, and the
/// read-only lookups, are unaffected.
pub struct Registry {
    feeds: RwLock<HashMap<String, Arc<dyn ErasedFeed>>>,
    silent: AtomicBool,
    config: RegistryConfig,
}

impl Registry {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry; new feeds inherit `config`'s policies
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            feeds: RwLock::new(HashMap::new()),
            silent: AtomicBool::new(config.silent),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Toggle silent mode
    pub fn set_silent(&self, silent: bool) -> &Self {
        self.silent.store(silent, Ordering::SeqCst);
        debug!("Registry silent mode {}", if silent { "enabled" } else { "disabled" });
        self
    }

    pub fn is_silent(&self) -> bool {
        self.silent.load(Ordering::SeqCst)
    }

    /// Install an empty feed carrying `T` under `name`
    ///
    /// With `replace` set, any existing feed is discarded together with its
    /// subscribers and history. Returns whether a feed was installed.
    pub fn create_feed<T>(&self, name: &str, replace: bool) -> FeedResult<bool>
    where
        T: Send + Sync + 'static,
    {
        let mut feeds = self.feeds.write();

        if !replace && feeds.contains_key(name) {
            drop(feeds);
            return self.skip_or_fail::<()>(FeedError::already_exists(name)).map(|_| false);
        }

        let feed: Arc<dyn ErasedFeed> = Arc::new(Feed::<T>::with_config(name, &self.config));
        match feeds.insert(name.to_string(), feed) {
            Some(previous) => info!(
                "Replaced feed '{}' ({} subscriber(s) and {} item(s) discarded)",
                name,
                previous.subscriber_names().len(),
                previous.len()
            ),
            None => info!("Created feed '{}' carrying {}", name, type_name::<T>()),
        }

        Ok(true)
    }

    /// Remove the feed called `name`, returning whether one was removed
    pub fn remove_feed(&self, name: &str) -> FeedResult<bool> {
        let removed = self.feeds.write().remove(name);
        match removed {
            Some(feed) => {
                info!(
                    "Removed feed '{}' ({} subscriber(s) dropped)",
                    name,
                    feed.subscriber_names().len()
                );
                Ok(true)
            }
            None => self.skip_or_fail::<()>(FeedError::not_found(name)).map(|_| false),
        }
    }

    /// Register `callback` as `subscriber` on feed `name`
    ///
    /// Returns `false` when the subscriber name is already taken on that feed
    /// (the first registration stays) or when silently skipped.
    pub fn subscribe_to<T, F>(&self, name: &str, subscriber: &str, callback: F) -> FeedResult<bool>
    where
        T: Send + Sync + 'static,
        F: Fn(&FeedItem<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        match self.resolve_typed::<T>(name)? {
            Some(feed) => Ok(feed.subscribe(subscriber, callback)),
            None => Ok(false),
        }
    }

    /// Remove `subscriber` from feed `name`, returning whether it was registered
    pub fn unsubscribe_to(&self, name: &str, subscriber: &str) -> FeedResult<bool> {
        match self.resolve(name)? {
            Some(feed) => Ok(feed.unsubscribe(subscriber)),
            None => Ok(false),
        }
    }

    /// Publish `value` on feed `name`
    ///
    /// Returns the published item, or `None` when silently skipped.
    pub fn publish<T>(&self, name: &str, value: T) -> FeedResult<Option<FeedItem<T>>>
    where
        T: Send + Sync + 'static,
    {
        match self.resolve_typed::<T>(name)? {
            Some(feed) => feed.publish(value).map(Some),
            None => Ok(None),
        }
    }

    /// Typed handle to feed `name`
    ///
    /// The handle stays valid after the feed is replaced or removed but is
    /// then detached from the registry.
    pub fn feed<T>(&self, name: &str) -> FeedResult<Arc<Feed<T>>>
    where
        T: Send + Sync + 'static,
    {
        let feed = self.lookup(name).ok_or_else(|| FeedError::not_found(name))?;
        downcast(name, feed)
    }

    /// Items retained by feed `name`, oldest first
    pub fn history<T>(&self, name: &str) -> FeedResult<Vec<FeedItem<T>>>
    where
        T: Send + Sync + 'static,
    {
        Ok(self.feed::<T>(name)?.history())
    }

    pub fn contains_feed(&self, name: &str) -> bool {
        self.feeds.read().contains_key(name)
    }

    /// Registered feed names, sorted
    pub fn feed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.feeds.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.read().len()
    }

    /// Subscriber names of feed `name` in delivery order
    pub fn subscriber_names(&self, name: &str) -> FeedResult<Vec<String>> {
        self.lookup(name)
            .map(|feed| feed.subscriber_names())
            .ok_or_else(|| FeedError::not_found(name))
    }

    pub fn feed_stats(&self, name: &str) -> FeedResult<FeedStats> {
        self.lookup(name)
            .map(|feed| feed.stats())
            .ok_or_else(|| FeedError::not_found(name))
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn ErasedFeed>> {
        self.feeds.read().get(name).cloned()
    }

    /// Existence check shared by subscribe, unsubscribe and publish
    fn resolve(&self, name: &str) -> FeedResult<Option<Arc<dyn ErasedFeed>>> {
        match self.lookup(name) {
            Some(feed) => Ok(Some(feed)),
            None => self.skip_or_fail(FeedError::not_found(name)),
        }
    }

    fn resolve_typed<T>(&self, name: &str) -> FeedResult<Option<Arc<Feed<T>>>>
    where
        T: Send + Sync + 'static,
    {
        match self.resolve(name)? {
            Some(feed) => downcast(name, feed).map(Some),
            None => Ok(None),
        }
    }

    fn skip_or_fail<R>(&self, error: FeedError) -> FeedResult<Option<R>> {
        if self.is_silent() {
            debug!("Silently skipping: {}", error);
            Ok(None)
        } else {
            Err(error)
        }
    }
}

fn downcast<T>(name: &str, feed: Arc<dyn ErasedFeed>) -> FeedResult<Arc<Feed<T>>>
where
    T: Send + Sync + 'static,
{
    let actual = feed.payload_type();
    feed.into_any()
        .downcast::<Feed<T>>()
        .map_err(|_| FeedError::TypeMismatch {
            feed: name.to_string(),
            expected: type_name::<T>(),
            actual,
        })
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry
///
/// Initialised on first access from the discovered configuration file
/// (falling back to defaults) and never torn down. Prefer explicit
/// [`Registry`] instances where the owner is known.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(|| {
        let config = ConfigManager::load()
            .and_then(|manager| manager.get_registry_config())
            .unwrap_or_else(|e| {
                warn!("Using default registry configuration: {:#}", e);
                RegistryConfig::default()
            });
        Registry::with_config(config)
    })
}
