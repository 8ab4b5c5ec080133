use super::records::LinkStore;
use crate::spotify::PlaylistClient;

use log::{error, info, warn};
use serenity::model::id::{ChannelId, MessageId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Longest a single playlist append may take before it is abandoned.
pub const APPEND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// subscriber has no playlist registered
    Skipped,
    TimedOut,
    Failed,
    /// tracks were added; `flipped` links of the message were acknowledged
    /// by this task, zero if another subscriber's task got there first
    Acknowledged { flipped: usize },
}

/// Appends a message's tracks to one subscriber's playlist and acknowledges
/// the message if that worked.
pub struct CompletionTask {
    message_id: MessageId,
    channel_id: ChannelId,
    playlist_id: String,
    track_ids: Arc<Vec<String>>,
    client: Box<dyn PlaylistClient>,
    store: LinkStore,
    append_timeout: Duration,
}

impl CompletionTask {
    pub fn new(
        message_id: MessageId,
        channel_id: ChannelId,
        playlist_id: String,
        track_ids: Arc<Vec<String>>,
        client: Box<dyn PlaylistClient>,
        store: LinkStore,
    ) -> CompletionTask {
        CompletionTask {
            message_id,
            channel_id,
            playlist_id,
            track_ids,
            client,
            store,
            append_timeout: APPEND_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, append_timeout: Duration) -> CompletionTask {
        self.append_timeout = append_timeout;
        self
    }

    pub async fn run(self) -> CompletionOutcome {
        if self.playlist_id.is_empty() {
            info!(
                "No playlist registered, not adding tracks from message {}",
                self.message_id
            );
            return CompletionOutcome::Skipped;
        }

        let append = self.client.append_tracks(&self.playlist_id, &self.track_ids);
        match timeout(self.append_timeout, append).await {
            Err(_) => {
                warn!(
                    "Timed out adding tracks from message {} to playlist {}",
                    self.message_id, self.playlist_id
                );
                CompletionOutcome::TimedOut
            }
            Ok(Err(why)) => {
                error!(
                    "Failed to add tracks from message {} to playlist {}: {why}",
                    self.message_id, self.playlist_id
                );
                CompletionOutcome::Failed
            }
            Ok(Ok(())) => {
                info!(
                    "Added {} tracks from message {} to playlist {}",
                    self.track_ids.len(),
                    self.message_id,
                    self.playlist_id
                );
                match self.store.acknowledge(self.message_id, self.channel_id).await {
                    Ok(Some(flipped)) => CompletionOutcome::Acknowledged { flipped },
                    Ok(None) => CompletionOutcome::Failed,
                    Err(why) => {
                        error!("Acknowledge task for message {} failed: {why}", self.message_id);
                        CompletionOutcome::Failed
                    }
                }
            }
        }
    }
}
