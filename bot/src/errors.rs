use std::{
    error::Error as StdError,
    fmt::{self, Display},
    result,
};

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Serenity(serenity::Error),
    Db(db::Error),
    Rusqlite(rusqlite::Error),
    Reqwest(reqwest::Error),
    Spotify(rspotify::ClientError),
    SpotifyId(rspotify::model::IdError),
    IoError(std::io::Error),
    Internal(String),
    BotMessage,
    ConstStr(&'static str),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serenity(inner) => fmt::Display::fmt(&inner, f),
            Error::Db(inner) => fmt::Display::fmt(&inner, f),
            Error::Rusqlite(inner) => fmt::Display::fmt(&inner, f),
            Error::Reqwest(inner) => fmt::Display::fmt(&inner, f),
            Error::Spotify(inner) => fmt::Display::fmt(&inner, f),
            Error::SpotifyId(inner) => fmt::Display::fmt(&inner, f),
            Error::IoError(inner) => fmt::Display::fmt(&inner, f),
            Error::Internal(inner) => f.write_str(inner),
            Error::ConstStr(inner) => f.write_str(inner),
            Error::BotMessage => f.write_str("Message is from a bot"),
        }
    }
}

impl StdError for Error {}

impl From<serenity::Error> for Error {
    fn from(e: serenity::Error) -> Error {
        Error::Serenity(e)
    }
}

impl From<db::Error> for Error {
    fn from(e: db::Error) -> Error {
        Error::Db(e)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        Error::Rusqlite(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Reqwest(e)
    }
}

impl From<rspotify::ClientError> for Error {
    fn from(e: rspotify::ClientError) -> Error {
        Error::Spotify(e)
    }
}

impl From<rspotify::model::IdError> for Error {
    fn from(e: rspotify::model::IdError) -> Error {
        Error::SpotifyId(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IoError(e)
    }
}
