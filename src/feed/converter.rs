use std::sync::Arc;
use url::Url;

use super::document::{AtomFeed, FeedDocument, FeedParser, FeedRsParser, ParseError, RssFeed};
use super::error::{LoadResult, LoadingError};
use crate::podcast::Podcast;

/// Parses feed bytes and validates them into a [`Podcast`].
#[derive(Clone)]
pub struct FeedConverter {
    parser: Arc<dyn FeedParser>,
}

impl Default for FeedConverter {
    fn default() -> Self {
        Self::new(FeedRsParser)
    }
}

impl std::fmt::Debug for FeedConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedConverter").finish_non_exhaustive()
    }
}

impl FeedConverter {
    pub fn new(parser: impl FeedParser) -> Self {
        Self {
            parser: Arc::new(parser),
        }
    }

    /// Parses `bytes` on the blocking pool, then converts the document.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn load(&self, bytes: Arc<[u8]>) -> LoadResult {
        let parser = Arc::clone(&self.parser);
        let parsed = tokio::task::spawn_blocking(move || parser.parse(&bytes))
            .await
            .map_err(|e| ParseError::Task(e.to_string()))?;

        let document = parsed.map_err(|e| {
            tracing::debug!(error = %e, "Feed body did not parse");
            LoadingError::FeedParsing(e)
        })?;

        convert(document)
    }
}

/// Converts a parsed document according to its dialect's rules.
pub fn convert(document: FeedDocument) -> LoadResult {
    match document {
        FeedDocument::Atom(atom) => convert_atom(atom),
        FeedDocument::Rss(rss) => convert_rss(rss),
        FeedDocument::Other(format) => Err(LoadingError::UnsupportedFormat(format)),
    }
}

fn parse_url(value: Option<&str>) -> Option<Url> {
    value.and_then(|v| Url::parse(v).ok())
}

fn convert_atom(atom: AtomFeed) -> LoadResult {
    let title = atom.title.ok_or(LoadingError::MissingAttribute("title"))?;

    let author = atom
        .authors
        .into_iter()
        .filter_map(|person| person.name)
        .collect::<Vec<_>>()
        .join(", ");

    let artwork_url =
        parse_url(atom.logo.as_deref()).ok_or(LoadingError::MissingAttribute("logo"))?;

    Ok(Podcast {
        title,
        author,
        artwork_url,
        description: atom.subtitle.unwrap_or_default(),
        primary_genre: atom.categories.into_iter().next().and_then(|c| c.label),
    })
}

fn convert_rss(rss: RssFeed) -> LoadResult {
    let title = rss.title.ok_or(LoadingError::MissingAttribute("title"))?;
    let author = rss
        .itunes
        .owner_name
        .ok_or(LoadingError::MissingAttribute("itunes:owner name"))?;
    let description = rss.description.unwrap_or_default();
    let artwork_url = parse_url(rss.itunes.image_href.as_deref())
        .ok_or(LoadingError::MissingAttribute("itunes:image url"))?;

    // Plain categories win over the iTunes ones
    let primary_genre = rss
        .categories
        .into_iter()
        .next()
        .or_else(|| rss.itunes.categories.into_iter().next());

    Ok(Podcast {
        title,
        author,
        artwork_url,
        description,
        primary_genre,
    })
}
