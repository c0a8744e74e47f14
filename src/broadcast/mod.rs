//! Feed broadcaster for pub/sub fan-out
//!
//! The broadcaster maps feed names to subscribers and fans published data
//! out to each of them as encoded event-stream records. Every subscriber owns
//! one unbounded `tokio::sync::mpsc` channel; the broadcaster holds the
//! sending half, the transport drains the receiving half.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<Broadcaster>
//!                     ┌─────────────────────────┐
//!                     │ feeds: HashMap<Feed,    │
//!                     │   Vec<Subscriber {      │
//!                     │     properties,         │
//!                     │     tx: mpsc::Tx,       │
//!                     │   }>                    │
//!                     │ >                       │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Publisher]            [Subscription]          [Subscription]
//!    publish(payload)       recv().await            recv().await
//!         │                       │                       │
//!         └──► render/encode ──► push ──► forward() ──► client
//! ```
//!
//! # Shared Records
//!
//! A literal payload is encoded once. `Record` wraps `bytes::Bytes`, so every
//! subscriber of the publish gets a reference-counted handle to the same
//! buffer and sees byte-identical output.
//!
//! # Termination
//!
//! `close` queues an end-of-stream marker behind whatever each subscriber has
//! not consumed yet. Subscriptions drain their queue and then end.

pub mod config;
pub mod error;
pub mod feed;
pub mod payload;
pub mod store;
pub mod subscriber;

pub use config::BroadcasterConfig;
pub use error::BroadcastError;
pub use feed::{Feeds, DEFAULT_FEED};
pub use payload::{BoxError, Payload};
pub use store::{Broadcaster, BroadcasterStats};
pub use subscriber::{BlockingIter, Properties, SubscribeOptions, Subscription};
