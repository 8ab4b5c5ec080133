use crate::errors::{Error, Result};

use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};

/// The parts of a chat message the link pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: GuildId,
    pub author_id: UserId,
    pub content: String,
}

impl LinkMessage {
    /// Fails for messages from bots and messages sent outside a guild.
    pub fn from_message(msg: &Message) -> Result<LinkMessage> {
        if msg.author.bot {
            return Err(Error::BotMessage);
        }
        let guild_id = msg
            .guild_id
            .ok_or(Error::ConstStr("Message was not sent in a guild"))?;

        Ok(LinkMessage {
            id: msg.id,
            channel_id: msg.channel_id,
            guild_id,
            author_id: msg.author.id,
            content: msg.content.clone(),
        })
    }
}
