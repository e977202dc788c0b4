//! Shared error type for the LMS crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that can cross the crate boundary into a service
///
/// Services translate these into their own HTTP-facing errors; nothing here
/// knows about status codes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad or unreadable configuration; fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A money value that does not parse as a decimal
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A storage operation did not finish within its bound; holds the
    /// operation name
    #[error("Timed out: {0}")]
    Timeout(String),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
