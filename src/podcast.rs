use serde::{Deserialize, Serialize};
use url::Url;

/// A podcast as described by its feed's channel-level metadata.
///
/// Only produced by the feed converter after the dialect's required fields
/// have been validated, so `title` is never empty and `artwork_url` is always
/// an absolute URL. `author` is empty only for Atom feeds without authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podcast {
    pub title: String,
    pub author: String,
    pub artwork_url: Url,
    pub description: String,
    pub primary_genre: Option<String>,
}
