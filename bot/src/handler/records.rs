use crate::chat::{ChatClient, ACK_EMOJI};
use crate::structs::LinkMessage;

use db::structs::NewLink;
use db::{WriteableDb, Writer};
use log::{debug, error, warn};
use serenity::model::id::{ChannelId, MessageId};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Stores link sightings and flags them once their tracks made it into a
/// playlist. All writes go through the single db writer.
#[derive(Clone)]
pub struct LinkStore {
    writer: Writer,
    chat: Arc<dyn ChatClient>,
}

impl LinkStore {
    pub fn new(writer: Writer, chat: Arc<dyn ChatClient>) -> LinkStore {
        LinkStore { writer, chat }
    }

    /// Queues one record per link without waiting on it. Returns `None` when
    /// there is nothing to store.
    pub fn record_links(
        &self,
        msg: &LinkMessage,
        links: Vec<NewLink>,
    ) -> Option<JoinHandle<()>> {
        if links.is_empty() {
            return None;
        }

        let (message_id, channel_id, guild_id) = (msg.id, msg.channel_id, msg.guild_id);
        debug!("Recording {} links for message {message_id}", links.len());
        Some(self.writer.submit_async("record links", move |db| {
            db.insert_message_links(message_id, channel_id, guild_id, &links)
        }))
    }

    /// Flags every link of the message as acknowledged, then reacts to the
    /// message once the write committed. Safe to call more than once, later
    /// calls change no rows but still react. Resolves to the number of links
    /// this call flipped, `None` if the write failed.
    pub fn acknowledge(
        &self,
        message_id: MessageId,
        channel_id: ChannelId,
    ) -> JoinHandle<Option<usize>> {
        let pending = self
            .writer
            .submit(move |db| Ok(db.acknowledge_message_links(message_id)?));
        let chat = self.chat.clone();

        tokio::spawn(async move {
            match pending.await {
                Ok(count) => {
                    debug!("Acknowledged {count} links for message {message_id}");
                    if let Err(why) = chat.add_reaction(channel_id, message_id, ACK_EMOJI).await {
                        warn!("Failed to react to message {message_id}: {why}");
                    }
                    Some(count)
                }
                Err(why) => {
                    error!("Failed to acknowledge links for message {message_id}: {why}");
                    None
                }
            }
        })
    }
}
