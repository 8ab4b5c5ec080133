use super::CommandContext;
use crate::errors::Result;
use crate::structs::Reply;

use chrono::Utc;
use db::structs::AuthRequest;
use db::WriteableDb;
use log::info;
use serenity::model::id::{GuildId, UserId};
use uuid::Uuid;

/// Finds or creates the user's account and guild subscription, then hands
/// out a link that starts the authorization flow. The callback matches the
/// flow back to the account through the random state. Stale requests are
/// dropped on the way.
pub async fn authorize(
    commands: &CommandContext,
    user_id: UserId,
    guild_id: GuildId,
) -> Result<Reply> {
    let state = Uuid::new_v4().to_string();
    let url = commands.music.authorize_url(&state)?;

    let account = commands
        .writer
        .submit_sync(move |db| {
            let now = Utc::now();
            let account = db.first_or_create_account(user_id)?;
            db.first_or_create_subscriber(guild_id, account.id)?;
            db.delete_expired_auth_requests(AuthRequest::expiry_cutoff(now))?;
            db.create_auth_request(&state, account.id, now)?;
            Ok(account)
        })
        .await?;
    info!(
        "Started authorization for account {} in guild {guild_id}",
        account.id
    );

    Ok(Reply::new(format!(
        "Please click this link to authorize with spotify.\n{url}"
    )))
}
