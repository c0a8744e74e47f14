//! Broadcaster implementation
//!
//! The central registry that maps feed names to subscribers and fans
//! published records out to them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Result;

use super::config::BroadcasterConfig;
use super::error::BroadcastError;
use super::feed::Feeds;
use super::payload::Payload;
use super::subscriber::{Properties, SubscribeOptions, Subscriber, Subscription};

/// Registered subscribers, guarded as one unit
struct Registry<P> {
    /// Feed name to subscribers, one entry per registration
    feeds: HashMap<String, Vec<Arc<Subscriber<P>>>>,

    /// Every registered subscriber exactly once, including those under no feed
    subscribers: Vec<Arc<Subscriber<P>>>,

    /// Set by the first `close`
    closed: bool,
}

impl<P> Registry<P> {
    fn new() -> Self {
        Self {
            feeds: HashMap::new(),
            subscribers: Vec::new(),
            closed: false,
        }
    }
}

/// Snapshot of broadcaster state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcasterStats {
    /// Number of feeds with at least one registration
    pub feeds: usize,
    /// Number of distinct registered subscribers
    pub subscribers: usize,
    /// Records queued by `publish` since creation
    ///
    /// Includes records queued behind an end-of-stream marker by a publish
    /// racing `close`, which no consumer reads.
    pub records_published: u64,
    /// Whether `close` has been called
    pub closed: bool,
}

/// Process-local publish/subscribe broadcaster
///
/// Subscribers register under one or more feeds and receive every record
/// published to those feeds, encoded as event-stream records. Thread-safe
/// via a single `RwLock`: `publish` takes a read lock only long enough to
/// snapshot the targeted subscriber lists, `subscribe` and `close` take the
/// write lock.
///
/// `P` is the per-subscriber properties type handed to differentiation
/// functions; it defaults to an empty string map.
pub struct Broadcaster<P = Properties> {
    /// Feed registrations
    registry: RwLock<Registry<P>>,

    /// Configuration
    config: BroadcasterConfig,

    next_subscriber_id: AtomicU64,
    records_published: AtomicU64,
}

impl<P> Broadcaster<P> {
    /// Create a new broadcaster with default configuration
    pub fn new() -> Self {
        Self::with_config(BroadcasterConfig::default())
    }

    /// Create a new broadcaster with custom configuration
    pub fn with_config(config: BroadcasterConfig) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            config,
            next_subscriber_id: AtomicU64::new(1),
            records_published: AtomicU64::new(0),
        }
    }

    /// Get the broadcaster configuration
    pub fn config(&self) -> &BroadcasterConfig {
        &self.config
    }

    /// Subscribe to one or more feeds
    ///
    /// The backlog in `options.initial_data` is queued before the subscriber
    /// is registered, so the consumer sees it ahead of any live record. A
    /// subscriber listed under several feeds shares one channel; a feed named
    /// twice is registered twice.
    ///
    /// With no feed at all the subscriber only ever sees its backlog and the
    /// end-of-stream marker sent by `close`.
    pub async fn subscribe(&self, options: SubscribeOptions<P>) -> Subscription {
        let SubscribeOptions {
            feeds,
            properties,
            initial_data,
        } = options;

        let feeds = feeds.unwrap_or_else(|| Feeds::one(self.config.default_feed.clone()));
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let backlog = initial_data.len();

        let (subscriber, subscription) = Subscriber::channel(id, properties);
        for record in initial_data {
            subscriber.push(record);
        }
        let subscriber = Arc::new(subscriber);

        let mut registry = self.registry.write().await;

        if registry.closed && self.config.reject_after_close {
            subscriber.end();
            tracing::debug!(
                subscriber = id,
                feeds = %feeds,
                backlog = backlog,
                "Subscriber ended immediately, broadcaster closed"
            );
            return subscription;
        }

        for feed in feeds.iter() {
            registry
                .feeds
                .entry(feed.to_string())
                .or_default()
                .push(Arc::clone(&subscriber));
        }
        registry.subscribers.push(subscriber);

        tracing::info!(
            subscriber = id,
            feeds = %feeds,
            backlog = backlog,
            subscribers = registry.subscribers.len(),
            "Subscriber added"
        );

        subscription
    }

    /// Publish to the given feeds
    ///
    /// Subscriber lists are snapshotted once, before any record is queued;
    /// subscribers added while the fan-out runs are not included. A literal
    /// payload is encoded once and shared by every subscriber. A
    /// differentiated payload is evaluated per subscriber and skips those for
    /// which it returns `None`.
    ///
    /// Unknown or empty feeds are not an error. Returns the number of records
    /// queued. If a differentiation function fails, the rest of the fan-out is
    /// abandoned and the error is returned.
    ///
    /// A `close` that lands between the snapshot and the fan-out puts the
    /// end-of-stream marker ahead of this publish's records. They still count
    /// as queued, but the consumer never reads them.
    pub async fn publish(
        &self,
        payload: impl Into<Payload<P>>,
        feeds: impl Into<Feeds>,
    ) -> Result<usize> {
        let payload = payload.into();
        let feeds = feeds.into();

        let targets: Vec<(&str, Vec<Arc<Subscriber<P>>>)> = {
            let registry = self.registry.read().await;
            feeds
                .iter()
                .map(|feed| (feed, registry.feeds.get(feed).cloned().unwrap_or_default()))
                .collect()
        };

        let mut queued = 0;
        let mut inert = 0;

        for (feed, subscribers) in &targets {
            for subscriber in subscribers {
                let record = match payload.render(&subscriber.properties) {
                    Ok(Some(record)) => record,
                    Ok(None) => continue,
                    Err(source) => {
                        self.records_published
                            .fetch_add(queued as u64, Ordering::Relaxed);
                        tracing::warn!(
                            feed = %feed,
                            subscriber = subscriber.id,
                            error = %source,
                            queued = queued,
                            "Differentiation failed, publish aborted"
                        );
                        return Err(BroadcastError::Differentiation {
                            feed: feed.to_string(),
                            subscriber: subscriber.id,
                            source,
                        }
                        .into());
                    }
                };

                if subscriber.push(record) {
                    queued += 1;
                } else {
                    inert += 1;
                    tracing::trace!(
                        feed = %feed,
                        subscriber = subscriber.id,
                        "Consumer dropped, record discarded"
                    );
                }
            }
        }

        self.records_published
            .fetch_add(queued as u64, Ordering::Relaxed);

        tracing::debug!(
            feeds = %feeds,
            differentiated = payload.is_differentiated(),
            queued = queued,
            inert = inert,
            "Published"
        );

        Ok(queued)
    }

    /// Publish to the configured default feed
    pub async fn publish_default(&self, payload: impl Into<Payload<P>>) -> Result<usize> {
        let feed = self.config.default_feed.clone();
        self.publish(payload, feed).await
    }

    /// Close the broadcaster
    ///
    /// Every registered subscriber receives the end-of-stream marker exactly
    /// once, whatever the number of feeds it is registered under, and all
    /// registrations are cleared. Calling `close` again finds nothing to
    /// notify.
    pub async fn close(&self) {
        let mut registry = self.registry.write().await;

        let mut notified = 0;
        for subscriber in &registry.subscribers {
            if subscriber.end() {
                notified += 1;
            }
        }

        let subscribers = registry.subscribers.len();
        let feeds = registry.feeds.len();
        registry.subscribers.clear();
        registry.feeds.clear();

        if registry.closed && subscribers == 0 {
            tracing::debug!("Broadcaster already closed");
        } else {
            tracing::info!(
                subscribers = subscribers,
                notified = notified,
                feeds = feeds,
                "Broadcaster closed"
            );
        }

        registry.closed = true;
    }

    /// Check if `close` has been called
    pub async fn is_closed(&self) -> bool {
        self.registry.read().await.closed
    }

    /// Number of registrations under a feed
    ///
    /// A subscriber that named the feed twice counts twice.
    pub async fn subscriber_count(&self, feed: &str) -> usize {
        self.registry
            .read()
            .await
            .feeds
            .get(feed)
            .map_or(0, Vec::len)
    }

    /// Number of feeds with at least one registration
    pub async fn feed_count(&self) -> usize {
        self.registry.read().await.feeds.len()
    }

    /// Get broadcaster statistics
    pub async fn stats(&self) -> BroadcasterStats {
        let registry = self.registry.read().await;

        BroadcasterStats {
            feeds: registry.feeds.len(),
            subscribers: registry.subscribers.len(),
            records_published: self.records_published.load(Ordering::Relaxed),
            closed: registry.closed,
        }
    }
}

impl<P> Default for Broadcaster<P> {
    fn default() -> Self {
        Self::new()
    }
}
