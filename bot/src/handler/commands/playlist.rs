use super::CommandContext;
use crate::errors::Result;
use crate::handler::links;
use crate::structs::Reply;

use db::{ReadOnlyDb, WriteableDb};
use log::info;
use serenity::model::id::{GuildId, UserId};

const NOT_AUTHORIZED: &str = "Please run /authorize-spotify in this server first.";

pub async fn register_playlist(
    commands: &CommandContext,
    user_id: UserId,
    guild_id: GuildId,
    link: &str,
) -> Result<Reply> {
    let playlist = match links::extract_playlist_id(link) {
        Some(playlist) => playlist,
        None => {
            return Ok(Reply::new_const(
                "Check your playlist link, we were not able to parse it.",
            ))
        }
    };

    let account = match commands.db.read_only_call(|db| db.get_account(user_id))? {
        Some(account) => account,
        None => return Ok(Reply::new_const(NOT_AUTHORIZED)),
    };

    let updated = commands
        .writer
        .submit_sync(move |db| Ok(db.set_subscriber_playlist(guild_id, account.id, &playlist)?))
        .await?;
    if updated == 0 {
        return Ok(Reply::new_const(NOT_AUTHORIZED));
    }

    info!("Account {} registered a playlist in guild {guild_id}", account.id);
    Ok(Reply::new_const("Your playlist was registered for this server."))
}
