mod authorize;
mod playlist;

use crate::errors::Result;
use crate::spotify::MusicService;
use crate::structs::Reply;

use db::{Database, Writer};
use log::{info, warn};
use serenity::model::application::command::{Command, CommandOptionType};
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOptionValue,
};
use serenity::prelude::*;
use std::sync::Arc;

pub const AUTHORIZE: &str = "authorize-spotify";
pub const REGISTER_PLAYLIST: &str = "register-spotify-playlist";
const PLAYLIST_LINK_OPTION: &str = "playlist-link";

/// What the commands need to reach the database and the music service.
#[derive(Clone)]
pub struct CommandContext {
    pub db: Database,
    pub writer: Writer,
    pub music: Arc<dyn MusicService>,
}

/// Replaces the bot's global commands with the ones handled here.
pub async fn register_commands(ctx: &Context) -> Result<()> {
    let commands = Command::set_global_application_commands(&ctx.http, |commands| {
        commands
            .create_application_command(|command| {
                command
                    .name(AUTHORIZE)
                    .description("Authorize the bot to add songs to your spotify playlists")
            })
            .create_application_command(|command| {
                command
                    .name(REGISTER_PLAYLIST)
                    .description("Set the playlist songs posted in this server are added to")
                    .create_option(|option| {
                        option
                            .name(PLAYLIST_LINK_OPTION)
                            .description("Link to the spotify playlist")
                            .kind(CommandOptionType::String)
                            .required(true)
                    })
            })
    })
    .await?;
    info!("Registered {} commands", commands.len());
    Ok(())
}

fn string_option<'a>(command: &'a ApplicationCommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| match &option.resolved {
            Some(CommandDataOptionValue::String(value)) => Some(value.as_str()),
            _ => None,
        })
}

pub async fn handle_command(
    command: &ApplicationCommandInteraction,
    commands: &CommandContext,
) -> Option<Reply> {
    let guild_id = match command.guild_id {
        Some(guild_id) => guild_id,
        None => return Some(Reply::new_const("Commands only work inside a server.")),
    };
    let user_id = command.user.id;

    let ret = match command.data.name.as_str() {
        AUTHORIZE => authorize::authorize(commands, user_id, guild_id).await,
        REGISTER_PLAYLIST => match string_option(command, PLAYLIST_LINK_OPTION) {
            Some(link) => playlist::register_playlist(commands, user_id, guild_id, link).await,
            None => Ok(Reply::new_const("A playlist link is required.")),
        },
        _ => Ok(Reply::new_const("Unrecognized command")),
    };

    match ret {
        Ok(resp) => Some(resp),
        Err(why) => {
            warn!("Failed to process command {} with err: {why}", command.data.name);
            Some(Reply::new_const("Something went wrong, please try again later."))
        }
    }
}
