//! Remote availability feed: snapshot types and transport.

pub mod client;
pub mod error;
pub mod snapshot;

pub use client::{FeedClient, HttpFeedClient};
pub use error::{FeedError, Result};
pub use snapshot::{FeedItem, FeedSnapshot};
