use super::SPOTIFY_DOMAIN;
use crate::errors::Result;

use log::trace;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING};
use reqwest::Client;
use serenity::async_trait;
use std::time::Duration;
use url::Url;

/// Most requests made to expand a single shortened link.
pub const MAX_REDIRECT_DEPTH: usize = 5;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait LinkExpander: Send + Sync {
    /// Makes one request to `link` and returns the url it ended up at.
    async fn resolve(&self, link: &str) -> Result<String>;
}

/// Expands links with HEAD requests, following whatever redirects the
/// client follows on its own.
pub struct HttpExpander {
    client: Client,
}

impl HttpExpander {
    pub fn new() -> Result<HttpExpander> {
        let client = Client::builder()
            // spotify.link serves browsers a page instead of a redirect
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(HttpExpander { client })
    }
}

#[async_trait]
impl LinkExpander for HttpExpander {
    async fn resolve(&self, link: &str) -> Result<String> {
        let resp = self
            .client
            .head(link)
            .header(ACCEPT, "*/*")
            .header(ACCEPT_ENCODING, "gzip, deflate")
            .send()
            .await?;
        Ok(resp.url().to_string())
    }
}

fn is_canonical(link: &str) -> bool {
    match Url::parse(link) {
        Ok(url) => url.host_str() == Some(SPOTIFY_DOMAIN),
        Err(_) => false,
    }
}

/// Follows a shortened link until it lands on the canonical domain, making
/// at most [`MAX_REDIRECT_DEPTH`] requests. If it never lands there the last
/// url seen is returned as is.
pub async fn expand_short_link(expander: &dyn LinkExpander, link: &str) -> Result<String> {
    let mut current = link.to_string();
    for hop in 0..MAX_REDIRECT_DEPTH {
        let next = expander.resolve(&current).await?;
        trace!("hop {hop}: {current} -> {next}");
        current = next;
        if is_canonical(&current) {
            break;
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeExpander;

    /// short link chain of `hops` requests ending on a track link
    fn chain(hops: usize) -> FakeExpander {
        let mut redirects = Vec::new();
        for i in 0..hops {
            let from = format!("https://spotify.link/hop{i}");
            let to = if i + 1 == hops {
                String::from("https://open.spotify.com/track/final")
            } else {
                format!("https://spotify.link/hop{}", i + 1)
            };
            redirects.push((from, to));
        }
        FakeExpander::from_pairs(redirects)
    }

    #[tokio::test]
    async fn test_expand_single_hop() {
        let expander = chain(1);
        let expanded = expand_short_link(&expander, "https://spotify.link/hop0")
            .await
            .unwrap();
        assert_eq!(expanded, "https://open.spotify.com/track/final");
        assert_eq!(expander.calls(), 1);
    }

    #[tokio::test]
    async fn test_expand_within_limit() {
        let expander = chain(MAX_REDIRECT_DEPTH);
        let expanded = expand_short_link(&expander, "https://spotify.link/hop0")
            .await
            .unwrap();
        assert_eq!(expanded, "https://open.spotify.com/track/final");
        assert_eq!(expander.calls(), MAX_REDIRECT_DEPTH);
    }

    #[tokio::test]
    async fn test_expand_stops_at_limit() {
        let expander = chain(MAX_REDIRECT_DEPTH + 3);
        let expanded = expand_short_link(&expander, "https://spotify.link/hop0")
            .await
            .unwrap();
        assert_eq!(expanded, format!("https://spotify.link/hop{MAX_REDIRECT_DEPTH}"));
        assert_eq!(expander.calls(), MAX_REDIRECT_DEPTH);
    }

    #[tokio::test]
    async fn test_expand_error() {
        let expander = FakeExpander::new(&[]);
        assert!(expand_short_link(&expander, "https://spotify.link/nowhere")
            .await
            .is_err());
    }

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical("https://open.spotify.com/track/abc"));
        assert!(!is_canonical("https://spotify.link/abc"));
        assert!(!is_canonical("https://example.com/?open.spotify.com"));
        assert!(!is_canonical("not a url"));
    }
}
