//! Broadcaster configuration

use super::feed::DEFAULT_FEED;

/// Broadcaster configuration options
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Feed used when a subscribe or publish call names none
    pub default_feed: String,

    /// End subscriptions created after `close` right after their backlog
    ///
    /// When disabled, a late subscriber is registered normally and waits
    /// for a close that may never come.
    pub reject_after_close: bool,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            default_feed: DEFAULT_FEED.to_string(),
            reject_after_close: true,
        }
    }
}

impl BroadcasterConfig {
    /// Set the default feed name
    pub fn default_feed(mut self, name: impl Into<String>) -> Self {
        self.default_feed = name.into();
        self
    }

    /// Register subscriptions created after `close` like any other
    pub fn allow_after_close(mut self) -> Self {
        self.reject_after_close = false;
        self
    }
}
