use crate::errors::Result;

use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;

#[derive(Debug, PartialEq, Eq)]
pub enum ReplyContents {
    String(String),
    ConstStr(&'static str),
}

/// Response to a slash command, only shown to the user who ran it.
#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    message: ReplyContents,
}

impl Reply {
    pub const fn new(message: String) -> Reply {
        Reply {
            message: ReplyContents::String(message),
        }
    }

    pub const fn new_const(message: &'static str) -> Reply {
        Reply {
            message: ReplyContents::ConstStr(message),
        }
    }

    pub fn content(&self) -> &str {
        match &self.message {
            ReplyContents::String(inner) => inner,
            ReplyContents::ConstStr(inner) => inner,
        }
    }

    pub async fn send(&self, ctx: &Context, command: &ApplicationCommandInteraction) -> Result<()> {
        command
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|data| data.content(self.content()).ephemeral(true))
            })
            .await?;
        Ok(())
    }
}
