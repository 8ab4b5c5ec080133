mod expand;

pub use expand::{expand_short_link, HttpExpander, LinkExpander};

use db::structs::{LinkType, NewLink};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::{Captures, Regex};

pub const SPOTIFY_DOMAIN: &str = "open.spotify.com";

const ALBUM_LINK: &str = "https://open.spotify.com/album/";
const ALBUM_URI: &str = "spotify:album:";

lazy_static! {
    // web links, app uris and shortened links in one pass so matches come
    // back in the order they were posted
    static ref LINK_RE: Regex = Regex::new(
        r"(?:https?://open\.spotify\.com/(?P<web>track|album)/|spotify:(?P<uri>track|album):)(?P<id>[a-zA-Z0-9]+)|(?P<short>https?://spotify\.link/[a-zA-Z0-9]+)"
    )
    .unwrap();
    static ref PLAYLIST_RE: Regex =
        Regex::new(r"https?://open\.spotify\.com/playlist/(?P<id>[a-zA-Z0-9]+)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpotifyId {
    Track(String),
    Album(String),
}

impl SpotifyId {
    fn from_captures(caps: &Captures<'_>) -> Option<SpotifyId> {
        let kind = caps.name("web").or_else(|| caps.name("uri"))?;
        let id = caps.name("id")?.as_str().to_string();
        match kind.as_str() {
            "album" => Some(SpotifyId::Album(id)),
            _ => Some(SpotifyId::Track(id)),
        }
    }
}

enum Found {
    Id(SpotifyId),
    Short(String),
}

fn find(text: &str) -> Vec<Found> {
    LINK_RE
        .captures_iter(text)
        .filter_map(|caps| match caps.name("short") {
            Some(short) => Some(Found::Short(short.as_str().to_string())),
            None => SpotifyId::from_captures(&caps).map(Found::Id),
        })
        .collect()
}

/// True if the text has anything that looks like a spotify link, including
/// ones that won't resolve to a track.
pub fn contains_link(text: &str) -> bool {
    text.contains(SPOTIFY_DOMAIN) || LINK_RE.is_match(text)
}

pub fn is_album(text: &str) -> bool {
    text.contains(ALBUM_LINK) || text.contains(ALBUM_URI)
}

/// Every recognized link in the text as it was posted, for storing.
pub fn get_links(text: &str) -> Vec<NewLink> {
    LINK_RE
        .captures_iter(text)
        .map(|caps| {
            let link = caps.get(0).map_or("", |m| m.as_str());
            let link_type = if caps.name("short").is_some() {
                LinkType::Short
            } else if is_album(link) {
                LinkType::Album
            } else {
                LinkType::Track
            };
            NewLink::new(link, Some(link_type))
        })
        .collect()
}

/// Ids of links that need no network round trip. Shortened links are skipped.
pub fn extract_direct_ids(text: &str) -> Vec<SpotifyId> {
    find(text)
        .into_iter()
        .filter_map(|found| match found {
            Found::Id(id) => Some(id),
            Found::Short(_) => None,
        })
        .collect()
}

/// Ids of every link in the text in posting order. Shortened links are
/// expanded first, a link that fails to expand is logged and left out.
pub async fn extract_ids(text: &str, expander: &dyn LinkExpander) -> Vec<SpotifyId> {
    let mut ids = Vec::new();
    for found in find(text) {
        match found {
            Found::Id(id) => ids.push(id),
            Found::Short(link) => match expand_short_link(expander, &link).await {
                Ok(expanded) => {
                    debug!("Expanded {link} to {expanded}");
                    // expanded links are never expanded again
                    ids.extend(extract_direct_ids(&expanded));
                }
                Err(why) => warn!("Failed to expand {link}: {why}"),
            },
        }
    }
    ids
}

pub fn extract_playlist_id(link: &str) -> Option<String> {
    PLAYLIST_RE
        .captures(link)
        .and_then(|caps| caps.name("id"))
        .map(|id| id.as_str().to_string())
}
