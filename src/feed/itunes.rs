//! Channel-level extraction of the iTunes podcast extension.
//!
//! `feed-rs` folds `itunes:*` channel elements into its generic model (or drops
//! them), so plain `<category>` values cannot be told apart from iTunes ones.
//! This scanner walks the raw XML once and keeps only what sits directly under
//! `<channel>`; anything inside `<item>` is ignored.
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Deepest element nesting we follow before giving up on the scan.
const MAX_DEPTH: usize = 64;

/// Channel metadata that `feed-rs` does not expose separately.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChannelExtensions {
    /// Text of `<itunes:owner><itunes:name>`.
    pub owner_name: Option<String>,
    /// `href` attribute of `<itunes:image>`.
    pub image_href: Option<String>,
    /// `text` attributes of top-level `<itunes:category>` elements, in order.
    pub itunes_categories: Vec<String>,
    /// Plain `<category>` values of the channel, in order.
    pub categories: Vec<String>,
}

/// Scans raw feed bytes for channel-level iTunes and category elements.
///
/// Never fails: malformed XML stops the scan and whatever was collected so far
/// is returned. Callers only run this after the feed itself parsed.
pub fn scan_channel(data: &[u8]) -> ChannelExtensions {
    let mut ext = ChannelExtensions::default();
    let mut reader = Reader::from_reader(data);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    // Text pieces of the innermost open element, trimmed once at its end
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                read_channel_attributes(&e, &reader, &path, &mut ext);
                path.push(e.name().as_ref().to_vec());
                text.clear();
                if path.len() > MAX_DEPTH {
                    tracing::debug!(depth = path.len(), "Feed nesting too deep, stopping iTunes scan");
                    break;
                }
            }
            Ok(Event::Empty(e)) => {
                read_channel_attributes(&e, &reader, &path, &mut ext);
            }
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(piece) => text.push_str(&piece),
                Err(e) => tracing::debug!(error = %e, "Skipping undecodable channel text"),
            },
            Ok(Event::CData(c)) => match reader.decoder().decode(&c) {
                Ok(piece) => text.push_str(&piece),
                Err(e) => tracing::debug!(error = %e, "Skipping undecodable channel CDATA"),
            },
            Ok(Event::End(_)) => {
                record_text(&path, text.trim(), &mut ext);
                path.pop();
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "XML error during iTunes scan");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    ext
}

fn ends_with(path: &[Vec<u8>], names: &[&[u8]]) -> bool {
    path.len() >= names.len()
        && path[path.len() - names.len()..]
            .iter()
            .zip(names)
            .all(|(seen, want)| seen.as_slice() == *want)
}

/// Handles attribute-carrying elements that are direct children of `<channel>`.
fn read_channel_attributes(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    path: &[Vec<u8>],
    ext: &mut ChannelExtensions,
) {
    if !ends_with(path, &[b"channel"]) {
        return;
    }

    let attribute = match e.name().as_ref() {
        b"itunes:image" => "href",
        b"itunes:category" => "text",
        _ => return,
    };

    let value = match e.try_get_attribute(attribute) {
        Ok(Some(attr)) => match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => value.trim().to_string(),
            Err(err) => {
                tracing::debug!(error = %err, attribute, "Skipping undecodable iTunes attribute");
                return;
            }
        },
        Ok(None) => return,
        Err(err) => {
            tracing::debug!(error = %err, attribute, "Skipping malformed iTunes attribute");
            return;
        }
    };

    if value.is_empty() {
        return;
    }

    if attribute == "href" {
        if ext.image_href.is_none() {
            ext.image_href = Some(value);
        }
    } else {
        ext.itunes_categories.push(value);
    }
}

fn record_text(path: &[Vec<u8>], text: &str, ext: &mut ChannelExtensions) {
    if text.is_empty() {
        return;
    }

    if ends_with(path, &[b"channel", b"itunes:owner", b"itunes:name"]) {
        if ext.owner_name.is_none() {
            ext.owner_name = Some(text.to_string());
        }
    } else if ends_with(path, &[b"channel", b"category"]) {
        ext.categories.push(text.to_string());
    }
}
