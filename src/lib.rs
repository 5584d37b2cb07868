pub mod config;
pub mod feeds;
pub mod logging;

pub use feeds::{global, Feed, FeedError, FeedItem, FeedResult, Registry};
