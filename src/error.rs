//! Error types
//!
//! Crate-wide error type wrapping the broadcaster and I/O failures.

use std::fmt;
use std::io;

use crate::broadcast::BroadcastError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Broadcaster operation failed
    Broadcast(BroadcastError),
    /// Writing a stream to its client failed
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Broadcast(e) => write!(f, "Broadcast error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Broadcast(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<BroadcastError> for Error {
    fn from(e: BroadcastError) -> Self {
        Error::Broadcast(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
