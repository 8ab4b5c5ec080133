use crate::errors::{Error, Result};
use crate::handler::links::SpotifyId;

use chrono::Utc;
use db::structs::Credential;
use log::{debug, info};
use rspotify::model::{AlbumId, PlayableId, PlaylistId, TrackId};
use rspotify::prelude::*;
use rspotify::{scopes, AuthCodeSpotify, ClientCredsSpotify, Config, Credentials, OAuth, Token};
use serenity::async_trait;
use std::collections::HashSet;
use url::Url;

// the api rejects more than this many items in one add request
const MAX_ITEMS_PER_ADD: usize = 100;
const ALBUM_PAGE_SIZE: u32 = 50;
const TOKEN_TYPE: &str = "Bearer";

fn playlist_scopes() -> HashSet<String> {
    scopes!("playlist-modify-public")
}

/// Client acting on behalf of one user.
#[async_trait]
pub trait PlaylistClient: Send + Sync {
    /// Appends the tracks to the end of the playlist as a single logical add.
    async fn append_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}

#[async_trait]
pub trait MusicService: Send + Sync {
    fn user_client(&self, credential: &Credential) -> Result<Box<dyn PlaylistClient>>;

    /// Ids of every track on the album, in album order.
    async fn album_track_ids(&self, album_id: &str) -> Result<Vec<String>>;

    /// Url of the cover art of the album, or of the album the track is on.
    async fn cover_image_url(&self, id: &SpotifyId) -> Result<Option<String>>;

    /// Url a user visits to grant access to their playlists. `state` comes back
    /// on the callback.
    fn authorize_url(&self, state: &str) -> Result<String>;

    /// Trades the code from an authorization callback for a credential.
    async fn exchange_code(&self, code: &str, account: i64) -> Result<Credential>;
}

pub struct Spotify {
    credentials: Credentials,
    redirect_uri: Url,
    app: ClientCredsSpotify,
}

fn config() -> Config {
    Config {
        token_refreshing: true,
        ..Default::default()
    }
}

impl Spotify {
    /// Fetches the app token used for catalog lookups.
    pub async fn connect(
        client_id: &str,
        client_secret: &str,
        redirect_uri: Url,
    ) -> Result<Spotify> {
        let credentials = Credentials::new(client_id, client_secret);
        let app = ClientCredsSpotify::with_config(credentials.clone(), config());
        app.request_token().await?;
        info!("connected to spotify");

        Ok(Spotify {
            credentials,
            redirect_uri,
            app,
        })
    }

    fn oauth(&self, state: &str) -> OAuth {
        OAuth {
            redirect_uri: self.redirect_uri.to_string(),
            state: state.to_string(),
            scopes: playlist_scopes(),
            ..Default::default()
        }
    }

    /// Client authorized as the credential's owner, refreshing its own token.
    fn user_spotify(&self, credential: &Credential) -> Result<AuthCodeSpotify> {
        if credential.access_token.is_empty() || credential.refresh_token.is_empty() {
            return Err(Error::ConstStr("credential is missing a token"));
        }

        let token = Token {
            access_token: credential.access_token.clone(),
            refresh_token: Some(credential.refresh_token.clone()),
            expires_at: Some(credential.expires_at),
            scopes: playlist_scopes(),
            ..Default::default()
        };
        let mut client = AuthCodeSpotify::from_token(token);
        client.creds = self.credentials.clone();
        client.oauth = self.oauth("");
        client.config = config();
        Ok(client)
    }
}

#[async_trait]
impl MusicService for Spotify {
    fn user_client(&self, credential: &Credential) -> Result<Box<dyn PlaylistClient>> {
        let client = self.user_spotify(credential)?;
        Ok(Box::new(UserClient { client }))
    }

    async fn album_track_ids(&self, album: &str) -> Result<Vec<String>> {
        let album_id = AlbumId::from_id(album)?;

        let mut track_ids = Vec::new();
        let mut offset = 0;
        loop {
            let page = self
                .app
                .album_track_manual(album_id.clone(), None, Some(ALBUM_PAGE_SIZE), Some(offset))
                .await?;
            let fetched = page.items.len() as u32;
            track_ids.extend(
                page.items
                    .into_iter()
                    .filter_map(|track| track.id)
                    .map(|id| id.id().to_string()),
            );

            offset += fetched;
            if page.next.is_none() || fetched == 0 {
                break;
            }
        }
        debug!("album {album} has {} tracks", track_ids.len());
        Ok(track_ids)
    }

    async fn cover_image_url(&self, id: &SpotifyId) -> Result<Option<String>> {
        let images = match id {
            SpotifyId::Track(track) => {
                self.app
                    .track(TrackId::from_id(track.as_str())?, None)
                    .await?
                    .album
                    .images
            }
            SpotifyId::Album(album) => {
                self.app
                    .album(AlbumId::from_id(album.as_str())?, None)
                    .await?
                    .images
            }
        };
        // largest first
        Ok(images.into_iter().next().map(|image| image.url))
    }

    fn authorize_url(&self, state: &str) -> Result<String> {
        let client =
            AuthCodeSpotify::with_config(self.credentials.clone(), self.oauth(state), config());
        Ok(client.get_authorize_url(false)?)
    }

    async fn exchange_code(&self, code: &str, account: i64) -> Result<Credential> {
        let client =
            AuthCodeSpotify::with_config(self.credentials.clone(), self.oauth(""), config());
        client.request_token(code).await?;

        let token = client.get_token();
        let token = token
            .lock()
            .await
            .map_err(|_| Error::ConstStr("failed to lock spotify token"))?
            .clone()
            .ok_or(Error::ConstStr("spotify returned no token"))?;

        Ok(Credential {
            account,
            refresh_token: token
                .refresh_token
                .ok_or(Error::ConstStr("spotify returned no refresh token"))?,
            access_token: token.access_token,
            token_type: String::from(TOKEN_TYPE),
            expires_at: token.expires_at.unwrap_or_else(Utc::now),
        })
    }
}

fn playable_items(track_ids: &[String]) -> Result<Vec<PlayableId<'_>>> {
    Ok(track_ids
        .iter()
        .map(|id| TrackId::from_id(id.as_str()).map(PlayableId::Track))
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

struct UserClient {
    client: AuthCodeSpotify,
}

#[async_trait]
impl PlaylistClient for UserClient {
    async fn append_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let playlist_id = PlaylistId::from_id(playlist_id)?;
        let items = playable_items(track_ids)?;

        for chunk in items.chunks(MAX_ITEMS_PER_ADD) {
            let chunk = chunk.iter().map(|id| id.as_ref());
            self.client
                .playlist_add_items(playlist_id.clone(), chunk, None)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spotify() -> Spotify {
        let credentials = Credentials::new("client-id", "client-secret");
        Spotify {
            app: ClientCredsSpotify::with_config(credentials.clone(), config()),
            credentials,
            redirect_uri: Url::parse("http://localhost:8081/callback").unwrap(),
        }
    }

    fn credential(access_token: &str) -> Credential {
        Credential {
            account: 1,
            refresh_token: String::from("refresh"),
            access_token: String::from(access_token),
            token_type: String::from(TOKEN_TYPE),
            expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_user_client_carries_app_settings() {
        let client = spotify().user_spotify(&credential("access")).unwrap();

        assert_eq!(client.creds.id, "client-id");
        assert_eq!(client.oauth.redirect_uri, "http://localhost:8081/callback");
        assert!(client.config.token_refreshing);

        let token = client.get_token();
        let token = token.lock().await.unwrap().clone().unwrap();
        assert_eq!(token.access_token, "access");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn test_user_client_needs_tokens() {
        assert!(spotify().user_spotify(&credential("")).is_err());
    }

    #[test]
    fn test_authorize_url_carries_state() {
        let url = spotify().authorize_url("some-state").unwrap();

        assert!(url.contains("state=some-state"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("playlist-modify-public"));
    }

    #[test]
    fn test_playable_items() {
        let ids = vec![String::from("4uLU6hMCjMI75M1A2tKUQC")];
        assert_eq!(playable_items(&ids).unwrap().len(), 1);

        let ids = vec![String::from("not/an id")];
        assert!(playable_items(&ids).is_err());
    }
}
