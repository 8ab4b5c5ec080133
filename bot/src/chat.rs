use crate::errors::Result;

use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::{MessageReference, ReactionType};
use serenity::model::id::{ChannelId, MessageId};

/// Reaction left on a message once its tracks were added to a playlist.
pub const ACK_EMOJI: &str = "✅";

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<()>;

    /// Replies to the message without pinging its author.
    async fn reply(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<()>;
}

#[async_trait]
impl ChatClient for Http {
    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: &str,
    ) -> Result<()> {
        channel_id
            .create_reaction(self, message_id, ReactionType::Unicode(emoji.to_string()))
            .await?;
        Ok(())
    }

    async fn reply(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        content: &str,
    ) -> Result<()> {
        channel_id
            .send_message(self, |builder| {
                builder
                    .reference_message(MessageReference::from((channel_id, message_id)))
                    .allowed_mentions(|f| f.replied_user(false));
                builder.content(content)
            })
            .await?;
        Ok(())
    }
}
