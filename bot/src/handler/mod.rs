pub mod commands;
pub mod completion;
pub mod dispatch;
pub mod links;
pub mod records;

use crate::errors::Error;
use crate::structs::LinkMessage;
use commands::CommandContext;
use dispatch::Dispatcher;

use log::{debug, error, info};
use serenity::{
    async_trait,
    model::{
        application::interaction::Interaction,
        channel::{Message, MessageType},
        gateway::Ready,
    },
    prelude::*,
};

pub struct Handler {
    dispatcher: Dispatcher,
    commands: CommandContext,
}

impl Handler {
    pub const fn new(dispatcher: Dispatcher, commands: CommandContext) -> Handler {
        Handler {
            dispatcher,
            commands,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.kind != MessageType::Regular && msg.kind != MessageType::InlineReply {
            return;
        }

        let link_message = match LinkMessage::from_message(&msg) {
            Ok(link_message) => link_message,
            // dont care about bot messages
            Err(Error::BotMessage) => return,
            Err(why) => {
                debug!("Ignoring message {}: {why}", msg.id);
                return;
            }
        };

        // completion tasks run on their own, nothing here waits on them
        let tasks = self.dispatcher.dispatch(&link_message).await;
        if !tasks.is_empty() {
            debug!("Started {} completions for message {}", tasks.len(), msg.id);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let command = match interaction {
            Interaction::ApplicationCommand(command) => command,
            _ => return,
        };
        info!(
            "Received command {} from user {}",
            command.data.name, command.user.id
        );

        if let Some(reply) = commands::handle_command(&command, &self.commands).await {
            if let Err(why) = reply.send(&ctx, &command).await {
                error!("Failed to reply to command {}: {why}", command.data.name);
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        if let Err(why) = commands::register_commands(&ctx).await {
            error!("Failed to register commands: {why}");
        }
    }
}
