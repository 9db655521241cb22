//! Fetches podcast RSS/Atom feeds and validates them into [`Podcast`] records.

pub mod config;
pub mod dispatch;
pub mod feed;
pub mod podcast;

pub use config::{CachePolicy, ConfigError, LoaderConfig};
pub use dispatch::{CallbackQueue, QueueClosed};
pub use feed::{LoadResult, LoadingError, PodcastFeedLoader};
pub use podcast::Podcast;
