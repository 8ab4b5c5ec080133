use super::queries;
use log::{info, trace};

use rusqlite::{Connection, Result};

macro_rules! migration {
    ( $n:literal, $( $x:literal ),* ) => {
        paste::item! {
            fn [< migration_$n >] (conn: &Connection) -> Result<()> {
                trace!("running migration {}", $n);

                $(
                    conn.execute($x, [])?;
                )*
                queries::set_version(conn, $n)?;
                trace!("finished migration {}", $n);
                Ok(())
            }
        }
    };
}

migration![
    1,
    "CREATE TABLE account (
        id INTEGER PRIMARY KEY,
        discord_user INTEGER NOT NULL UNIQUE,
        created_at NUMERIC NOT NULL DEFAULT CURRENT_TIMESTAMP
    );",
    // one credential per account, replaced on every completed authorization
    "CREATE TABLE credential (
        account INTEGER PRIMARY KEY,
        refresh_token TEXT NOT NULL,
        access_token TEXT NOT NULL,
        token_type TEXT NOT NULL,
        expires_at NUMERIC NOT NULL,
        FOREIGN KEY(account) REFERENCES account(id) ON DELETE CASCADE
    );",
    "CREATE TABLE subscription (
        id INTEGER PRIMARY KEY,
        account INTEGER NOT NULL,
        guild INTEGER NOT NULL,
        playlist TEXT NOT NULL DEFAULT '',
        FOREIGN KEY(account) REFERENCES account(id) ON DELETE CASCADE
    );",
    "CREATE TABLE message_link (
        id INTEGER PRIMARY KEY,
        message INTEGER NOT NULL,
        channel INTEGER NOT NULL,
        guild INTEGER NOT NULL,
        link TEXT NOT NULL,
        link_type TEXT DEFAULT NULL,
        acknowledged BOOLEAN NOT NULL DEFAULT FALSE
    );",
    "CREATE UNIQUE INDEX idx_subscription ON subscription (guild, account);",
    "CREATE UNIQUE INDEX idx_message_link ON message_link (message, link);"
];

migration![
    2,
    "CREATE TABLE auth_request (
        state TEXT PRIMARY KEY,
        account INTEGER NOT NULL,
        created_at NUMERIC NOT NULL,
        FOREIGN KEY(account) REFERENCES account(id) ON DELETE CASCADE
    );"
];

pub fn migrate(conn: &mut Connection) -> Result<()> {
    // be sure to increment this everytime a new migration is added
    const FINAL_VER: u32 = 2;

    let ver = queries::get_version(conn)?;
    info!("database version is currently: {ver} with target ver {FINAL_VER}");
    if ver == FINAL_VER {
        return Ok(());
    }

    let tx = conn.transaction()?;
    trace!("starting migration transaction");

    if ver < 1 {
        migration_1(&tx)?;
    }

    if ver < 2 {
        migration_2(&tx)?;
    }

    trace!("commiting migration transaction");
    tx.commit()?;
    info!("migration successful");
    Ok(())
}
