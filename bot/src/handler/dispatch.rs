use super::completion::{CompletionOutcome, CompletionTask};
use super::links::{self, LinkExpander, SpotifyId};
use super::records::LinkStore;
use crate::chat::ChatClient;
use crate::spotify::MusicService;
use crate::structs::LinkMessage;

use db::{Database, ReadOnlyDb};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Turns a chat message into one playlist append per subscriber of the guild.
pub struct Dispatcher {
    db: Database,
    store: LinkStore,
    chat: Arc<dyn ChatClient>,
    music: Arc<dyn MusicService>,
    expander: Arc<dyn LinkExpander>,
    in_flight: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(
        db: Database,
        store: LinkStore,
        chat: Arc<dyn ChatClient>,
        music: Arc<dyn MusicService>,
        expander: Arc<dyn LinkExpander>,
        max_in_flight: usize,
    ) -> Dispatcher {
        Dispatcher {
            db,
            store,
            chat,
            music,
            expander,
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    /// Records the message's links and spawns a completion task for every
    /// subscriber that can take its tracks, then replies with the cover art.
    /// Returns once the tasks are spawned, not when they finish.
    pub async fn dispatch(&self, msg: &LinkMessage) -> Vec<JoinHandle<CompletionOutcome>> {
        if !links::contains_link(&msg.content) {
            return Vec::new();
        }
        info!(
            "Message {} from {} in guild {} has a spotify link",
            msg.id, msg.author_id, msg.guild_id
        );

        let ids = links::extract_ids(&msg.content, self.expander.as_ref()).await;
        self.store.record_links(msg, links::get_links(&msg.content));
        if ids.is_empty() {
            debug!("No track or album ids in message {}", msg.id);
            return Vec::new();
        }

        let guild_id = msg.guild_id;
        let subscribers = match self.db.read_only_call(|db| db.get_subscribers(guild_id)) {
            Ok(subscribers) => subscribers,
            Err(why) => {
                error!("Failed to get subscribers for guild {guild_id}: {why}");
                return Vec::new();
            }
        };
        if subscribers.is_empty() {
            debug!("No subscribers in guild {guild_id}");
            return Vec::new();
        }

        let track_ids = self.resolve_tracks(&ids).await;
        if track_ids.is_empty() {
            info!("No tracks found for message {}", msg.id);
            return Vec::new();
        }
        // shared read only by every task, nothing accumulates between subscribers
        let track_ids = Arc::new(track_ids);

        let mut tasks = Vec::with_capacity(subscribers.len());
        for subscriber in subscribers {
            let credential = match &subscriber.credential {
                Some(credential) => credential,
                None => {
                    warn!(
                        "Account {} never finished authorizing, skipping",
                        subscriber.account
                    );
                    continue;
                }
            };
            let client = match self.music.user_client(credential) {
                Ok(client) => client,
                Err(why) => {
                    error!("Failed to build client for account {}: {why}", subscriber.account);
                    continue;
                }
            };

            let task = CompletionTask::new(
                msg.id,
                msg.channel_id,
                subscriber.playlist,
                track_ids.clone(),
                client,
                self.store.clone(),
            );
            let in_flight = self.in_flight.clone();
            tasks.push(tokio::spawn(async move {
                // never closed, so acquiring can't fail
                let _permit = in_flight.acquire_owned().await.ok();
                task.run().await
            }));
        }

        if !tasks.is_empty() {
            self.send_cover_art(msg, &ids).await;
        }
        tasks
    }

    /// Replies with each distinct cover image of the linked albums and tracks.
    async fn send_cover_art(&self, msg: &LinkMessage, ids: &[SpotifyId]) {
        let mut urls: Vec<String> = Vec::new();
        for id in ids {
            match self.music.cover_image_url(id).await {
                Ok(Some(url)) if !urls.contains(&url) => urls.push(url),
                Ok(_) => (),
                Err(why) => warn!("Failed to get cover art for {id:?}: {why}"),
            }
        }

        for url in urls {
            match self.chat.reply(msg.channel_id, msg.id, &url).await {
                Ok(()) => debug!("Sent cover art for message {}", msg.id),
                Err(why) => warn!("Failed to send cover art for message {}: {why}", msg.id),
            }
        }
    }

    /// Track ids for every link in order, albums expanded into their tracks.
    async fn resolve_tracks(&self, ids: &[SpotifyId]) -> Vec<String> {
        let mut track_ids = Vec::new();
        for id in ids {
            match id {
                SpotifyId::Track(track) => track_ids.push(track.clone()),
                SpotifyId::Album(album) => match self.music.album_track_ids(album).await {
                    Ok(tracks) => track_ids.extend(tracks),
                    Err(why) => error!("Failed to get tracks for album {album}: {why}"),
                },
            }
        }
        track_ids
    }
}
