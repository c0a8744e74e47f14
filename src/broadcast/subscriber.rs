//! Subscriber channels
//!
//! Each subscription owns one unbounded, ordered queue. The broadcaster keeps
//! the sending half together with the subscriber's properties; the consumer
//! drains the receiving half through [`Subscription`].

use std::collections::HashMap;
use std::fmt;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::sse::Record;

use super::feed::Feeds;

/// Default subscriber properties: an empty string map unless set
pub type Properties = HashMap<String, String>;

/// Options for [`Broadcaster::subscribe`](super::Broadcaster::subscribe)
#[derive(Debug, Clone)]
pub struct SubscribeOptions<P = Properties> {
    /// Feeds to register under (`None` = the configured default feed)
    pub feeds: Option<Feeds>,

    /// Properties handed to differentiation functions
    pub properties: P,

    /// Records queued before any live traffic, in order
    pub initial_data: Vec<Record>,
}

impl<P: Default> Default for SubscribeOptions<P> {
    fn default() -> Self {
        Self::with_properties(P::default())
    }
}

impl<P> SubscribeOptions<P> {
    /// Options for the default feed with the given properties
    pub fn with_properties(properties: P) -> Self {
        Self {
            feeds: None,
            properties,
            initial_data: Vec::new(),
        }
    }

    /// Set the feeds to register under
    pub fn feeds(mut self, feeds: impl Into<Feeds>) -> Self {
        self.feeds = Some(feeds.into());
        self
    }

    /// Set the subscriber properties
    pub fn properties(mut self, properties: P) -> Self {
        self.properties = properties;
        self
    }

    /// Set the backlog replayed before live traffic
    pub fn initial_data<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        self.initial_data = items.into_iter().map(|item| Record::encode(&item)).collect();
        self
    }
}

/// Item carried by a subscriber channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Message {
    /// An encoded record to hand to the consumer
    Record(Record),
    /// End-of-stream marker; the subscription yields nothing after it
    EndOfStream,
}

/// Registered side of a subscription
pub(super) struct Subscriber<P> {
    /// Unique id within the broadcaster
    pub(super) id: u64,
    /// Opaque properties passed to differentiation functions
    pub(super) properties: P,
    tx: mpsc::UnboundedSender<Message>,
}

impl<P> Subscriber<P> {
    /// Create a subscriber and the consumer-facing subscription paired with it
    pub(super) fn channel(id: u64, properties: P) -> (Self, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();

        let subscriber = Self { id, properties, tx };
        let subscription = Subscription {
            id,
            rx,
            finished: false,
        };

        (subscriber, subscription)
    }

    /// Queue a record
    ///
    /// Returns `false` if the consumer has been dropped; the entry is then inert.
    pub(super) fn push(&self, record: Record) -> bool {
        self.tx.send(Message::Record(record)).is_ok()
    }

    /// Queue the end-of-stream marker
    pub(super) fn end(&self) -> bool {
        self.tx.send(Message::EndOfStream).is_ok()
    }
}

/// Consumer side of a subscription
///
/// Yields encoded records in the order they were queued: the initial backlog
/// first, then live publishes. The sequence ends once the broadcaster is
/// closed (or dropped). It cannot be restarted; subscribe again instead.
///
/// # Example
/// ```no_run
/// use sse_fanout::{Broadcaster, SubscribeOptions};
///
/// # async fn example() -> sse_fanout::Result<()> {
/// let broadcaster: Broadcaster = Broadcaster::new();
/// let mut subscription = broadcaster.subscribe(SubscribeOptions::default()).await;
///
/// tokio::spawn(async move {
///     while let Some(record) = subscription.recv().await {
///         print!("{}", record);
///     }
/// });
///
/// broadcaster.publish_default("hello").await?;
/// broadcaster.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Message>,
    finished: bool,
}

impl Subscription {
    /// Id of the subscriber behind this subscription
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Check if the end of the stream has been reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Wait for the next record
    ///
    /// Returns `None` once the stream has ended. Suspends the calling task
    /// until a record or the end-of-stream marker arrives; there is no timeout.
    pub async fn recv(&mut self) -> Option<Record> {
        if self.finished {
            return None;
        }

        let message = self.rx.recv().await;
        self.accept(message)
    }

    /// Blocking variant of [`recv`](Self::recv) for use outside async code
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_recv(&mut self) -> Option<Record> {
        if self.finished {
            return None;
        }

        let message = self.rx.blocking_recv();
        self.accept(message)
    }

    /// Turn the subscription into a blocking iterator of records
    pub fn into_blocking_iter(self) -> BlockingIter {
        BlockingIter { inner: self }
    }

    /// Write every record verbatim to `writer` until the stream ends
    ///
    /// The writer is flushed after each record so clients see events as
    /// they are published. Returns the number of records written.
    pub async fn forward<W>(&mut self, writer: &mut W) -> Result<usize>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut written = 0;

        while let Some(record) = self.recv().await {
            writer.write_all(record.as_bytes()).await?;
            writer.flush().await?;
            written += 1;
        }

        tracing::debug!(subscriber = self.id, records = written, "Subscription forwarded");

        Ok(written)
    }

    /// Next raw channel item, without end-of-stream handling
    #[cfg(test)]
    pub(super) fn try_recv_message(
        &mut self,
    ) -> std::result::Result<Message, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }

    fn accept(&mut self, message: Option<Message>) -> Option<Record> {
        match message {
            Some(Message::Record(record)) => Some(record),
            Some(Message::EndOfStream) | None => {
                self.finished = true;
                None
            }
        }
    }
}

/// Blocking iterator over a [`Subscription`]
///
/// Each call to `next` blocks the current thread; see
/// [`Subscription::blocking_recv`].
#[derive(Debug)]
pub struct BlockingIter {
    inner: Subscription,
}

impl Iterator for BlockingIter {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.inner.blocking_recv()
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_pending, assert_ready_eq, task};

    use super::*;

    #[tokio::test]
    async fn test_fifo_order() {
        let (subscriber, mut subscription) = Subscriber::channel(1, ());

        assert!(subscriber.push(Record::encode("a")));
        assert!(subscriber.push(Record::encode("b")));
        assert!(subscriber.end());

        assert_eq!(subscription.recv().await.unwrap().value(), "a");
        assert_eq!(subscription.recv().await.unwrap().value(), "b");
        assert!(subscription.recv().await.is_none());
        assert!(subscription.is_finished());
    }

    #[tokio::test]
    async fn test_nothing_after_end_of_stream() {
        let (subscriber, mut subscription) = Subscriber::channel(1, ());

        subscriber.end();
        subscriber.push(Record::encode("late"));

        assert!(subscription.recv().await.is_none());
        assert!(subscription.recv().await.is_none());
    }

    #[test]
    fn test_recv_waits_for_data() {
        let (subscriber, mut subscription) = Subscriber::channel(7, ());

        let mut fut = task::spawn(subscription.recv());
        assert_pending!(fut.poll());

        subscriber.push(Record::encode("ready"));
        assert!(fut.is_woken());
        assert_ready_eq!(fut.poll(), Some(Record::encode("ready")));
    }

    #[test]
    fn test_subscribe_options_builder() {
        let options = SubscribeOptions::default()
            .feeds(["a", "b"])
            .properties(5u32)
            .initial_data(["start 1", "start 2"]);

        assert_eq!(options.feeds, Some(Feeds::from(["a", "b"])));
        assert_eq!(options.properties, 5);
        assert_eq!(options.initial_data[1].as_str(), "data: start 2\n\n");

        let defaults: SubscribeOptions = SubscribeOptions::default();
        assert!(defaults.feeds.is_none());
        assert!(defaults.properties.is_empty());
        assert!(defaults.initial_data.is_empty());
    }

    #[test]
    fn test_push_to_dropped_consumer() {
        let (subscriber, subscription) = Subscriber::channel(1, ());
        drop(subscription);

        assert!(!subscriber.end());
        assert!(!subscriber.push(Record::encode("lost")));
    }

    #[test]
    fn test_ends_when_sender_dropped() {
        let (subscriber, subscription) = Subscriber::channel(1, ());
        subscriber.push(Record::encode("last"));
        drop(subscriber);

        let values: Vec<String> = subscription.into_blocking_iter().map(|r| r.value()).collect();
        assert_eq!(values, vec!["last"]);
    }

    #[tokio::test]
    async fn test_forward_writes_verbatim() {
        let (subscriber, mut subscription) = Subscriber::channel(1, ());
        subscriber.push(Record::encode("one"));
        subscriber.push(Record::encode("two\nlines"));
        subscriber.end();

        let mut out: Vec<u8> = Vec::new();
        let written = subscription.forward(&mut out).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "data: one\n\ndata: two\ndata: lines\n\n"
        );
    }
}
