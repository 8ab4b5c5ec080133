use crate::connections::GetConnectionMutable;
use crate::errors;
use crate::structs::{Account, Credential, LinkType, NewLink, Subscriber};
use crate::ReadOnlyDb;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use rusqlite::{Error, Result};
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};

pub trait WriteableDb: GetConnectionMutable + ReadOnlyDb {
    #[inline]
    fn first_or_create_account(&self, user_id: UserId) -> Result<Account> {
        let count = self.execute(
            "INSERT INTO account (discord_user) VALUES (?1)
            ON CONFLICT(discord_user) DO NOTHING",
            [*user_id.as_u64()],
        )?;
        if count > 0 {
            info!("Created account for discord user {user_id}");
        }

        match self.get_account(user_id)? {
            Some(account) => Ok(account),
            None => {
                warn!("No account for user {user_id} found despite being just added");
                Err(Error::QueryReturnedNoRows)
            }
        }
    }

    #[inline]
    fn first_or_create_subscriber(&self, guild_id: GuildId, account: i64) -> Result<Subscriber> {
        let count = self.execute(
            "INSERT INTO subscription (account, guild) VALUES (?1, ?2)
            ON CONFLICT(guild, account) DO NOTHING",
            (account, *guild_id.as_u64()),
        )?;
        if count > 0 {
            info!("Created subscription for account {account} in guild {guild_id}");
        }

        match self.get_subscriber(guild_id, account)? {
            Some(subscriber) => Ok(subscriber),
            None => {
                warn!("No subscription for account {account} found despite being just added");
                Err(Error::QueryReturnedNoRows)
            }
        }
    }

    /// Returns the number of subscriptions updated, 0 if the account never
    /// authorized in this guild.
    #[inline]
    fn set_subscriber_playlist(
        &self,
        guild_id: GuildId,
        account: i64,
        playlist: &str,
    ) -> Result<usize> {
        self.execute(
            "UPDATE subscription SET playlist = (?1)
            WHERE guild = (?2) AND account = (?3)",
            (playlist, *guild_id.as_u64(), account),
        )
    }

    #[inline]
    fn save_credential(&self, credential: &Credential) -> Result<()> {
        self.execute(
            "INSERT INTO credential
                (account, refresh_token, access_token, token_type, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(account) DO UPDATE SET
                refresh_token=excluded.refresh_token,
                access_token=excluded.access_token,
                token_type=excluded.token_type,
                expires_at=excluded.expires_at",
            (
                credential.account,
                &credential.refresh_token,
                &credential.access_token,
                &credential.token_type,
                credential.expires_at,
            ),
        )?;
        debug!("Saved credential for account {}", credential.account);
        Ok(())
    }

    #[inline]
    fn create_auth_request(
        &self,
        state: &str,
        account: i64,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        self.execute(
            "INSERT INTO auth_request (state, account, created_at) VALUES (?1, ?2, ?3)",
            (state, account, created_at),
        )?;
        Ok(())
    }

    /// Drops requests created before `cutoff`, returns how many went.
    #[inline]
    fn delete_expired_auth_requests(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let count = self.execute("DELETE FROM auth_request WHERE created_at < (?1)", [cutoff])?;
        if count > 0 {
            info!("Deleted {count} expired auth requests");
        }
        Ok(count)
    }

    #[inline]
    fn delete_auth_request(&self, state: &str) -> Result<()> {
        self.execute("DELETE FROM auth_request WHERE state = (?1)", [state])?;
        Ok(())
    }

    /// Returns true if the link was new for this message.
    #[inline]
    fn insert_message_link(
        &self,
        message_id: MessageId,
        channel_id: ChannelId,
        guild_id: GuildId,
        link: &str,
        link_type: Option<LinkType>,
    ) -> Result<bool> {
        debug!("Inserting link {link:?} for message {message_id}");
        let count = self.execute(
            "INSERT INTO message_link (message, channel, guild, link, link_type)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(message, link) DO NOTHING",
            (
                *message_id.as_u64(),
                *channel_id.as_u64(),
                *guild_id.as_u64(),
                link,
                link_type.map(|t| t.as_str()),
            ),
        )?;
        Ok(count > 0)
    }

    /// Inserts every link of a message, carrying on past rows that fail.
    /// Returns how many links were new, or `PartialBatch` once every link was
    /// attempted if any of them failed.
    fn insert_message_links(
        &self,
        message_id: MessageId,
        channel_id: ChannelId,
        guild_id: GuildId,
        links: &[NewLink],
    ) -> errors::Result<usize> {
        let mut created = 0;
        let mut failed = 0;
        for link in links {
            match self.insert_message_link(
                message_id,
                channel_id,
                guild_id,
                &link.link,
                link.link_type,
            ) {
                Ok(true) => created += 1,
                Ok(false) => (),
                Err(why) => {
                    error!("Error saving link {:?} for message {message_id}: {why}", link.link);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(errors::Error::PartialBatch {
                failed,
                total: links.len(),
            });
        }
        Ok(created)
    }

    /// Flags every link of the message as acknowledged in one transaction.
    /// Only rows still unacknowledged are touched, so the returned count is 0
    /// on repeated calls.
    #[inline]
    fn acknowledge_message_links(&mut self, message_id: MessageId) -> Result<usize> {
        let tx = self.get_mutable_connection().transaction()?;
        let count = tx.execute(
            "UPDATE message_link SET acknowledged = TRUE
            WHERE message = (?1) AND acknowledged = FALSE",
            [*message_id.as_u64()],
        )?;
        tx.commit()?;

        debug!("Acknowledged {count} links for message {message_id}");
        Ok(count)
    }
}
