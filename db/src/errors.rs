use std::{
    error::Error as StdError,
    fmt::{self, Display},
    result,
};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Rusqlite(rusqlite::Error),
    IoError(std::io::Error),
    /// The writer dropped the job before it produced a result, either because
    /// the writer thread is gone or because the job panicked.
    JobDropped,
    /// Some rows of a multi-row write failed, the rest were written.
    PartialBatch {
        failed: usize,
        total: usize,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Rusqlite(inner) => fmt::Display::fmt(&inner, f),
            Error::IoError(inner) => fmt::Display::fmt(&inner, f),
            Error::JobDropped => f.write_str("write job was dropped before completing"),
            Error::PartialBatch { failed, total } => {
                write!(f, "{failed} of {total} rows in batch failed to write")
            }
        }
    }
}

impl StdError for Error {}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        Error::Rusqlite(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IoError(e)
    }
}
