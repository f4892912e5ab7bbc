use std::{io, result};
use thiserror::Error;

/// The result type of the logger initialisation.
pub type Result<T> = result::Result<T, Error>;

/// The errors which can occur while initializing the poller logger.
#[derive(Debug, Error)]
pub enum Error {
    #[error("a poller logger has already been initialized")]
    AlreadyInitialized,
    #[error("logger configuration is invalid, {0}")]
    InvalidConfig(String),
    #[error("failed to prepare the log file location, {0}")]
    Io(#[from] io::Error),
}

impl PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        matches!(
            (self, other),
            (Error::AlreadyInitialized, Error::AlreadyInitialized)
                | (Error::InvalidConfig(_), Error::InvalidConfig(_))
                | (Error::Io(_), Error::Io(_))
        )
    }
}
