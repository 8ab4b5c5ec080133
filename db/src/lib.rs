mod errors;
mod migrations;
mod queries;
mod read_only_db;
pub mod structs;
mod writeable_db;
pub mod writer;

pub use errors::{Error, Result};
pub use read_only_db::ReadOnlyDb;
pub use writeable_db::WriteableDb;
pub use writer::{Pending, Writer};

use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::time::Duration;

pub(crate) mod connections {
    use rusqlite::{Connection, Params, Result};

    pub trait GetConnectionImmutable {
        fn get_connection(&self) -> &Connection;

        #[inline(always)]
        fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
            self.get_connection().execute(sql, params)
        }
    }

    pub trait GetConnectionMutable {
        fn get_mutable_connection(&mut self) -> &mut Connection;
    }
}

pub struct ReadOnlyConn {
    conn: Connection,
}

impl connections::GetConnectionImmutable for ReadOnlyConn {
    #[inline]
    fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl ReadOnlyDb for ReadOnlyConn {}

pub struct WriteableConn {
    conn: Connection,
}

impl connections::GetConnectionImmutable for WriteableConn {
    #[inline]
    fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl connections::GetConnectionMutable for WriteableConn {
    #[inline]
    fn get_mutable_connection(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl ReadOnlyDb for WriteableConn {}

impl WriteableDb for WriteableConn {}

// sqlite only allows a single writer, readers wait on it for at most this long
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the sqlite database file. Cheap to clone, every read opens its
/// own read only connection. The only writeable connection in the process
/// should be the one owned by the [`Writer`].
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Database {
        Database { path: path.into() }
    }

    fn open_read_only(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn open_read_write(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        // WAL lets the read only connections run alongside the writer
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::trace!("opened {} with journal mode {mode}", self.path.display());
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    #[inline]
    pub fn read_only(&self) -> rusqlite::Result<ReadOnlyConn> {
        Ok(ReadOnlyConn {
            conn: self.open_read_only()?,
        })
    }

    #[inline]
    pub(crate) fn writeable(&self) -> rusqlite::Result<WriteableConn> {
        Ok(WriteableConn {
            conn: self.open_read_write()?,
        })
    }

    #[inline]
    pub fn migrate(&self) -> rusqlite::Result<()> {
        migrations::migrate(&mut self.open_read_write()?)
    }

    #[inline]
    pub fn read_only_call<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(ReadOnlyConn) -> rusqlite::Result<T>,
    {
        f(self.read_only()?)
    }
}
