use crate::structs::{Credential, LinkType, MessageLink, Subscriber};
use rusqlite::{Connection, Result, Row};

#[inline(always)]
pub fn get_version(conn: &Connection) -> Result<u32> {
    conn.query_row("SELECT user_version FROM pragma_user_version;", [], |row| {
        row.get(0)
    })
}

#[inline(always)]
pub fn set_version(conn: &Connection, version: u32) -> Result<()> {
    conn.pragma_update(None, "user_version", version)
}

pub const MESSAGE_LINK_COLUMNS: &str =
    "id, message, channel, guild, link, link_type, acknowledged";

#[inline(always)]
pub fn message_link_from_row(row: &Row<'_>) -> Result<MessageLink> {
    let link_type: Option<String> = row.get(5)?;
    Ok(MessageLink {
        id: row.get(0)?,
        message: row.get(1)?,
        channel: row.get(2)?,
        guild: row.get(3)?,
        link: row.get(4)?,
        link_type: link_type.as_deref().and_then(LinkType::parse),
        acknowledged: row.get(6)?,
    })
}

// subscription columns first, then the LEFT JOINed credential which is
// entirely NULL for accounts that never finished authorizing
pub const SUBSCRIBER_COLUMNS: &str = "S.id, S.guild, S.account, S.playlist,
    C.refresh_token, C.access_token, C.token_type, C.expires_at";

#[inline(always)]
pub fn subscriber_from_row(row: &Row<'_>) -> Result<Subscriber> {
    let account: i64 = row.get(2)?;
    let refresh_token: Option<String> = row.get(4)?;
    let credential = match refresh_token {
        Some(refresh_token) => Some(Credential {
            account,
            refresh_token,
            access_token: row.get(5)?,
            token_type: row.get(6)?,
            expires_at: row.get(7)?,
        }),
        None => None,
    };

    Ok(Subscriber {
        id: row.get(0)?,
        guild: row.get(1)?,
        account,
        playlist: row.get(3)?,
        credential,
    })
}
