//! # sse-fanout
//!
//! In-process publish/subscribe broadcaster for Server-Sent Events.
//!
//! Subscribers register under named feeds and receive every value published
//! to those feeds, rendered as `data:` framed, blank-line terminated records
//! ready to be written to an event-stream response.
//!
//! ## Features
//!
//! - Multiple feeds per subscriber, sharing one ordered channel
//! - Per-subscriber payloads computed from subscriber properties
//! - Initial backlog replayed ahead of live traffic
//! - Multi-line values kept in a single record
//! - Graceful termination of every stream on `close`
//!
//! ## Example
//!
//! ```no_run
//! use sse_fanout::{Broadcaster, Payload, SubscribeOptions};
//!
//! # async fn example() -> sse_fanout::Result<()> {
//! let broadcaster = Broadcaster::<u32>::new();
//!
//! let mut alice = broadcaster
//!     .subscribe(SubscribeOptions::with_properties(1).initial_data(["welcome"]))
//!     .await;
//!
//! broadcaster.publish_default("hello everyone").await?;
//! broadcaster
//!     .publish_default(Payload::differentiated(|id: &u32| Some(format!("hi #{}", id))))
//!     .await?;
//! broadcaster.close().await;
//!
//! while let Some(record) = alice.recv().await {
//!     print!("{}", record);
//! }
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod error;
pub mod sse;

pub use broadcast::{
    Broadcaster, BroadcasterConfig, BroadcasterStats, Feeds, Payload, Properties,
    SubscribeOptions, Subscription, DEFAULT_FEED,
};
pub use error::{Error, Result};
pub use sse::Record;
