use feed_rs::model::{Feed, FeedType, Text};
use thiserror::Error;

use super::itunes::{scan_channel, ChannelExtensions};

/// Errors reported by a [`FeedParser`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes are not an RSS, Atom or JSON feed.
    #[error(transparent)]
    Feed(#[from] feed_rs::parser::ParseFeedError),
    /// The background parse task panicked or was cancelled.
    #[error("parser task failed: {0}")]
    Task(String),
}

/// A parsed feed, tagged by dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedDocument {
    Atom(AtomFeed),
    Rss(RssFeed),
    /// A dialect the converter does not model (e.g. JSON Feed).
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomFeed {
    pub title: Option<String>,
    pub authors: Vec<AtomPerson>,
    pub logo: Option<String>,
    pub subtitle: Option<String>,
    pub categories: Vec<AtomCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomPerson {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomCategory {
    pub term: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssFeed {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Plain `<category>` values of the channel.
    pub categories: Vec<String>,
    pub itunes: ITunesChannel,
}

/// Channel-level fields of the iTunes podcast extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ITunesChannel {
    pub owner_name: Option<String>,
    pub image_href: Option<String>,
    pub categories: Vec<String>,
}

/// Turns raw feed bytes into a [`FeedDocument`].
///
/// Implementations are synchronous; the converter runs them on the blocking
/// pool so a slow parse never stalls the async workers.
pub trait FeedParser: Send + Sync + 'static {
    fn parse(&self, bytes: &[u8]) -> Result<FeedDocument, ParseError>;
}

/// Default parser: `feed-rs` for the document, plus a raw channel scan for the
/// iTunes extension on RSS feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedRsParser;

impl FeedParser for FeedRsParser {
    fn parse(&self, bytes: &[u8]) -> Result<FeedDocument, ParseError> {
        let feed = feed_rs::parser::parse(bytes)?;

        let document = match feed.feed_type {
            FeedType::Atom => FeedDocument::Atom(atom_from_feed(feed)),
            FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2 => {
                FeedDocument::Rss(rss_from_feed(feed, scan_channel(bytes)))
            }
            FeedType::JSON => FeedDocument::Other("JSON Feed".to_string()),
        };

        Ok(document)
    }
}

/// Trimmed text content, `None` when absent or blank.
fn text_content(text: Option<Text>) -> Option<String> {
    text.and_then(|t| non_blank(t.content))
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

fn atom_from_feed(feed: Feed) -> AtomFeed {
    AtomFeed {
        title: text_content(feed.title),
        authors: feed
            .authors
            .into_iter()
            .map(|p| AtomPerson {
                name: non_blank(p.name),
            })
            .collect(),
        logo: feed.logo.and_then(|image| non_blank(image.uri)),
        subtitle: text_content(feed.description),
        categories: feed
            .categories
            .into_iter()
            .map(|c| AtomCategory {
                term: c.term,
                label: c.label.and_then(non_blank),
            })
            .collect(),
    }
}

fn rss_from_feed(feed: Feed, ext: ChannelExtensions) -> RssFeed {
    RssFeed {
        title: text_content(feed.title),
        description: text_content(feed.description),
        categories: ext.categories,
        itunes: ITunesChannel {
            owner_name: ext.owner_name,
            image_href: ext.image_href,
            categories: ext.itunes_categories,
        },
    }
}
