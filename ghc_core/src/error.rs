//! Errors of the meetup calendar.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("unexpected response status {0}")]
    Status(reqwest::StatusCode),
}

pub type Result<T> = std::result::Result<T, Error>;
