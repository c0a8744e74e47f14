//! Broadcaster error types

use super::payload::BoxError;

/// Error type for broadcaster operations
#[derive(Debug)]
pub enum BroadcastError {
    /// A differentiation function failed for one subscriber
    ///
    /// Fan-out of the failing publish stops at this subscriber; records
    /// already queued for earlier subscribers stay queued.
    Differentiation {
        /// Feed being published to
        feed: String,
        /// Subscriber whose properties were being evaluated
        subscriber: u64,
        /// Error returned by the differentiation function
        source: BoxError,
    },
}

impl std::fmt::Display for BroadcastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BroadcastError::Differentiation {
                feed,
                subscriber,
                source,
            } => write!(
                f,
                "Differentiation failed on feed '{}' for subscriber {}: {}",
                feed, subscriber, source
            ),
        }
    }
}

impl std::error::Error for BroadcastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BroadcastError::Differentiation { source, .. } => Some(source.as_ref()),
        }
    }
}
