//! In memory stand-ins for the chat and music services plus a throwaway
//! database, shared by the unit tests.

use crate::chat::ChatClient;
use crate::errors::{Error, Result};
use crate::handler::links::{LinkExpander, SpotifyId};
use crate::spotify::{MusicService, PlaylistClient};
use crate::structs::LinkMessage;

use chrono::{TimeZone, Utc};
use db::structs::{Credential, MessageLink, Subscriber};
use db::{Database, ReadOnlyDb, WriteableDb, Writer};
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub fn link_message(id: u64, guild_id: GuildId, content: &str) -> LinkMessage {
    LinkMessage {
        id: MessageId(id),
        channel_id: ChannelId(500),
        guild_id,
        author_id: UserId(900),
        content: content.to_string(),
    }
}

/// Migrated database in a temp dir with a running writer.
pub struct TestEnv {
    pub db: Database,
    pub writer: Writer,
    _dir: TempDir,
}

impl TestEnv {
    pub fn new() -> TestEnv {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("test.db3"));
        db.migrate().unwrap();
        let writer = Writer::start(&db).unwrap();
        TestEnv {
            db,
            writer,
            _dir: dir,
        }
    }

    /// Resolves once every write queued before it has run.
    pub async fn barrier(&self) {
        self.writer.submit_sync(|_| Ok(())).await.unwrap();
    }

    pub fn message_links(&self, message_id: MessageId) -> Vec<MessageLink> {
        self.db
            .read_only_call(|db| db.get_message_links(message_id))
            .unwrap()
    }

    /// Authorizes `user` in `guild`, storing a credential only if an access
    /// token is given.
    pub async fn add_subscriber(
        &self,
        user: UserId,
        guild: GuildId,
        playlist: &str,
        access_token: Option<&str>,
    ) -> Subscriber {
        let playlist = playlist.to_string();
        let access_token = access_token.map(String::from);
        self.writer
            .submit_sync(move |db| {
                let account = db.first_or_create_account(user)?;
                db.first_or_create_subscriber(guild, account.id)?;
                db.set_subscriber_playlist(guild, account.id, &playlist)?;
                if let Some(access_token) = access_token {
                    db.save_credential(&Credential {
                        account: account.id,
                        refresh_token: String::from("refresh"),
                        access_token,
                        token_type: String::from("Bearer"),
                        expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                    })?;
                }
                Ok(db.get_subscriber(guild, account.id)?.unwrap())
            })
            .await
            .unwrap()
    }
}

#[derive(Default)]
pub struct FakeChat {
    reactions: Mutex<Vec<(ChannelId, MessageId, String)>>,
    replies: Mutex<Vec<(ChannelId, MessageId, String)>>,
}

impl FakeChat {
    pub fn reactions(&self) -> Vec<(ChannelId, MessageId, String)> {
        self.reactions.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<(ChannelId, MessageId, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<()> {
        self.reactions
            .lock()
            .unwrap()
            .push((channel_id, message_id, emoji.to_string()));
        Ok(())
    }

    async fn reply(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((channel_id, message_id, content.to_string()));
        Ok(())
    }
}

/// Redirects from a fixed table, unknown links fail.
pub struct FakeExpander {
    redirects: HashMap<String, String>,
    calls: AtomicUsize,
}

impl FakeExpander {
    pub fn new(redirects: &[(&str, &str)]) -> FakeExpander {
        FakeExpander::from_pairs(
            redirects
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        )
    }

    pub fn from_pairs(redirects: Vec<(String, String)>) -> FakeExpander {
        FakeExpander {
            redirects: redirects.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkExpander for FakeExpander {
    async fn resolve(&self, link: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.redirects
            .get(link)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("no redirect for {link}")))
    }
}

type Appends = Arc<Mutex<Vec<(String, Vec<String>)>>>;

#[derive(Default)]
pub struct FakePlaylist {
    appends: Appends,
    failing: HashSet<String>,
    fail_all: bool,
    delay: Option<Duration>,
}

impl FakePlaylist {
    pub fn failing() -> FakePlaylist {
        FakePlaylist {
            fail_all: true,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> FakePlaylist {
        self.delay = Some(delay);
        self
    }

    pub fn appends(&self) -> Appends {
        self.appends.clone()
    }
}

#[async_trait]
impl PlaylistClient for FakePlaylist {
    async fn append_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all || self.failing.contains(playlist_id) {
            return Err(Error::ConstStr("playlist append failed"));
        }
        self.appends
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), track_ids.to_vec()));
        Ok(())
    }
}

/// Music service where every user client appends into one shared log.
#[derive(Default)]
pub struct FakeMusic {
    albums: HashMap<String, Vec<String>>,
    covers: HashMap<SpotifyId, String>,
    broken_tokens: HashSet<String>,
    failing_playlists: HashSet<String>,
    appends: Appends,
}

impl FakeMusic {
    pub fn with_album(mut self, album: &str, tracks: &[&str]) -> FakeMusic {
        self.albums.insert(
            album.to_string(),
            tracks.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_cover(mut self, id: SpotifyId, url: &str) -> FakeMusic {
        self.covers.insert(id, url.to_string());
        self
    }

    /// Building a client for a credential with this access token fails.
    pub fn with_broken_token(mut self, access_token: &str) -> FakeMusic {
        self.broken_tokens.insert(access_token.to_string());
        self
    }

    pub fn with_failing_playlist(mut self, playlist: &str) -> FakeMusic {
        self.failing_playlists.insert(playlist.to_string());
        self
    }

    pub fn appends(&self) -> Vec<(String, Vec<String>)> {
        self.appends.lock().unwrap().clone()
    }
}

#[async_trait]
impl MusicService for FakeMusic {
    fn user_client(&self, credential: &Credential) -> Result<Box<dyn PlaylistClient>> {
        if self.broken_tokens.contains(&credential.access_token) {
            return Err(Error::ConstStr("bad credential"));
        }
        Ok(Box::new(FakePlaylist {
            appends: self.appends.clone(),
            failing: self.failing_playlists.clone(),
            ..Default::default()
        }))
    }

    async fn album_track_ids(&self, album_id: &str) -> Result<Vec<String>> {
        self.albums
            .get(album_id)
            .cloned()
            .ok_or(Error::ConstStr("no such album"))
    }

    async fn cover_image_url(&self, id: &SpotifyId) -> Result<Option<String>> {
        Ok(self.covers.get(id).cloned())
    }

    fn authorize_url(&self, state: &str) -> Result<String> {
        Ok(format!("https://accounts.example.com/authorize?state={state}"))
    }

    async fn exchange_code(&self, code: &str, account: i64) -> Result<Credential> {
        if code == "bad" {
            return Err(Error::ConstStr("code rejected"));
        }
        Ok(Credential {
            account,
            refresh_token: format!("refresh-{code}"),
            access_token: format!("access-{code}"),
            token_type: String::from("Bearer"),
            expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        })
    }
}
