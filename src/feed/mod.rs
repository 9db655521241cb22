//! Podcast feed loading: fetch, parse and convert.
//!
//! - [`fetcher`] - HTTP retrieval, status classification and the response cache
//! - [`converter`] - dialect dispatch and required-field validation
//! - [`document`] - the parsed feed model and the `FeedParser` capability
//! - [`itunes`] - raw XML scan for channel-level iTunes extension fields
//!
//! # Example
//!
//! ```ignore
//! use podcast_feed_loader::{CallbackQueue, LoaderConfig, PodcastFeedLoader};
//!
//! let (callbacks, _thread) = CallbackQueue::spawn("feed-callbacks")?;
//! let loader = PodcastFeedLoader::new(&LoaderConfig::default(), callbacks)?;
//!
//! loader.fetch(url, |result| match result {
//!     Ok(podcast) => println!("{}", podcast.title),
//!     Err(e) => eprintln!("{e}"),
//! });
//! ```

mod converter;
mod document;
mod error;
mod fetcher;
mod itunes;

pub use converter::{convert, FeedConverter};
pub use document::{
    AtomCategory, AtomFeed, AtomPerson, FeedDocument, FeedParser, FeedRsParser, ITunesChannel,
    ParseError, RssFeed,
};
pub use error::{LoadResult, LoadingError};
pub use fetcher::{classify_status, LoaderBuildError, PodcastFeedLoader};
pub use itunes::{scan_channel, ChannelExtensions};
