use crate::connections::GetConnectionImmutable;
use crate::queries;
use crate::structs::{Account, AuthRequest, MessageLink, Subscriber};

use rusqlite::{OptionalExtension, Result};
use serenity::model::id::{GuildId, MessageId, UserId};

pub trait ReadOnlyDb: GetConnectionImmutable {
    #[inline]
    fn get_account(&self, user_id: UserId) -> Result<Option<Account>> {
        self.get_connection()
            .query_row(
                "SELECT id, discord_user FROM account WHERE discord_user = (?1)",
                [*user_id.as_u64()],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        discord_user: row.get(1)?,
                    })
                },
            )
            .optional()
    }

    /// Every subscription registered in the guild with the owning account's
    /// credential loaded alongside it.
    #[inline]
    fn get_subscribers(&self, guild_id: GuildId) -> Result<Vec<Subscriber>> {
        let mut stmt = self.get_connection().prepare(&format!(
            "SELECT {}
            FROM subscription AS S
            LEFT JOIN credential AS C ON C.account = S.account
            WHERE S.guild = (?1)
            ORDER BY S.id",
            queries::SUBSCRIBER_COLUMNS
        ))?;

        let rows = stmt.query_map([*guild_id.as_u64()], queries::subscriber_from_row)?;

        let mut subscribers = Vec::new();
        for row in rows {
            subscribers.push(row?)
        }
        Ok(subscribers)
    }

    #[inline]
    fn get_subscriber(&self, guild_id: GuildId, account: i64) -> Result<Option<Subscriber>> {
        self.get_connection()
            .query_row(
                &format!(
                    "SELECT {}
                    FROM subscription AS S
                    LEFT JOIN credential AS C ON C.account = S.account
                    WHERE S.guild = (?1) AND S.account = (?2)",
                    queries::SUBSCRIBER_COLUMNS
                ),
                (*guild_id.as_u64(), account),
                queries::subscriber_from_row,
            )
            .optional()
    }

    #[inline]
    fn get_message_links(&self, message_id: MessageId) -> Result<Vec<MessageLink>> {
        let mut stmt = self.get_connection().prepare(&format!(
            "SELECT {} FROM message_link WHERE message = (?1) ORDER BY id",
            queries::MESSAGE_LINK_COLUMNS
        ))?;

        let rows = stmt.query_map([*message_id.as_u64()], queries::message_link_from_row)?;

        let mut links = Vec::new();
        for row in rows {
            links.push(row?)
        }
        Ok(links)
    }

    #[inline]
    fn get_auth_request(&self, state: &str) -> Result<Option<AuthRequest>> {
        self.get_connection()
            .query_row(
                "SELECT state, account, created_at FROM auth_request WHERE state = (?1)",
                [state],
                |row| {
                    Ok(AuthRequest {
                        state: row.get(0)?,
                        account: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
    }
}
