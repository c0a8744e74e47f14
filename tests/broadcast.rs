//! End-to-end broadcaster behaviour as seen by a stream consumer

use std::sync::Arc;

use sse_fanout::sse::decode;
use sse_fanout::{Broadcaster, Feeds, Payload, SubscribeOptions, Subscription};

/// Drain a subscription to its end and concatenate every record
async fn read(mut subscription: Subscription) -> String {
    let mut out = String::new();
    while let Some(record) = subscription.recv().await {
        out.push_str(record.as_str());
    }
    out
}

#[tokio::test]
async fn test_single() {
    let p: Broadcaster = Broadcaster::new();
    let s = p.subscribe(SubscribeOptions::default()).await;

    p.publish_default("test").await.unwrap();
    p.close().await;

    assert_eq!(read(s).await, "data: test\n\n");
}

#[tokio::test]
async fn test_multiple() {
    let p: Broadcaster = Broadcaster::new();
    let s1 = p.subscribe(SubscribeOptions::default()).await;
    let s2 = p.subscribe(SubscribeOptions::default()).await;
    let s3 = p.subscribe(SubscribeOptions::default()).await;

    assert_eq!(p.publish_default("test").await.unwrap(), 3);
    p.close().await;

    for s in [s1, s2, s3] {
        assert_eq!(read(s).await, "data: test\n\n");
    }
}

#[tokio::test]
async fn test_channel() {
    let p: Broadcaster = Broadcaster::new();
    let s1 = p
        .subscribe(SubscribeOptions::default().feeds("channel 1"))
        .await;
    let s2 = p
        .subscribe(SubscribeOptions::default().feeds("channel 2"))
        .await;
    let s3 = p
        .subscribe(SubscribeOptions::default().feeds(["channel 1", "channel 2"]))
        .await;

    p.publish("test1", "channel 1").await.unwrap();
    p.publish("test2", "channel 2").await.unwrap();
    p.close().await;

    assert_eq!(read(s1).await, "data: test1\n\n");
    assert_eq!(read(s2).await, "data: test2\n\n");
    assert_eq!(read(s3).await, "data: test1\n\ndata: test2\n\n");
}

#[tokio::test]
async fn test_publish_to_several_feeds() {
    let p: Broadcaster = Broadcaster::new();
    let a = p.subscribe(SubscribeOptions::default().feeds("a")).await;
    let b = p.subscribe(SubscribeOptions::default().feeds("b")).await;
    let c = p.subscribe(SubscribeOptions::default().feeds("c")).await;

    assert_eq!(p.publish("both", ["a", "b"]).await.unwrap(), 2);
    p.close().await;

    assert_eq!(read(a).await, "data: both\n\n");
    assert_eq!(read(b).await, "data: both\n\n");
    assert_eq!(read(c).await, "");
}

#[tokio::test]
async fn test_custom() {
    let p = Broadcaster::<u32>::new();
    let s1 = p.subscribe(SubscribeOptions::with_properties(1)).await;
    let s2 = p.subscribe(SubscribeOptions::with_properties(2)).await;

    p.publish_default(Payload::differentiated(|properties: &u32| Some(*properties)))
        .await
        .unwrap();
    p.close().await;

    assert_eq!(read(s1).await, "data: 1\n\n");
    assert_eq!(read(s2).await, "data: 2\n\n");
}

#[tokio::test]
async fn test_custom_skips_subscribers() {
    let p = Broadcaster::<&'static str>::new();
    let admin = p.subscribe(SubscribeOptions::with_properties("admin")).await;
    let guest = p.subscribe(SubscribeOptions::with_properties("guest")).await;

    let queued = p
        .publish_default(Payload::differentiated(|role: &&str| {
            (*role == "admin").then_some("restricted")
        }))
        .await
        .unwrap();
    p.publish_default("public").await.unwrap();
    p.close().await;

    assert_eq!(queued, 1);
    assert_eq!(read(admin).await, "data: restricted\n\ndata: public\n\n");
    assert_eq!(read(guest).await, "data: public\n\n");
}

#[tokio::test]
async fn test_initial_data() {
    let p: Broadcaster = Broadcaster::new();
    let s = p
        .subscribe(SubscribeOptions::default().initial_data(["start 1", "start 2"]))
        .await;

    p.publish_default("test").await.unwrap();
    p.close().await;

    assert_eq!(
        read(s).await,
        "data: start 1\n\n\
         data: start 2\n\n\
         data: test\n\n"
    );
}

#[tokio::test]
async fn test_multiline() {
    let p: Broadcaster = Broadcaster::new();
    let s = p.subscribe(SubscribeOptions::default()).await;

    p.publish_default("line 1\nline 2").await.unwrap();
    p.close().await;

    assert_eq!(read(s).await, "data: line 1\ndata: line 2\n\n");
}

#[tokio::test]
async fn test_close_twice() {
    let p: Broadcaster = Broadcaster::new();
    let mut s = p.subscribe(SubscribeOptions::default()).await;

    p.publish_default("test").await.unwrap();
    p.close().await;
    p.close().await;

    assert_eq!(s.recv().await.unwrap().as_str(), "data: test\n\n");
    assert!(s.recv().await.is_none());
    assert!(s.is_finished());
    assert!(p.is_closed().await);
}

#[tokio::test]
async fn test_subscriber_without_feeds_is_closed() {
    let p: Broadcaster = Broadcaster::new();
    let s = p
        .subscribe(
            SubscribeOptions::default()
                .feeds(Feeds::none())
                .initial_data(["only backlog"]),
        )
        .await;

    assert_eq!(p.feed_count().await, 0);
    assert_eq!(p.publish_default("live").await.unwrap(), 0);

    p.close().await;

    assert_eq!(read(s).await, "data: only backlog\n\n");
}

#[tokio::test]
async fn test_round_trip() {
    let values = [
        "plain",
        "",
        "two\nlines",
        "trailing\n",
        "data: looks like a field",
        "unicode \u{2603}",
    ];

    let p: Broadcaster = Broadcaster::new();
    let s = p.subscribe(SubscribeOptions::default()).await;

    for value in values {
        p.publish_default(value).await.unwrap();
    }
    p.close().await;

    assert_eq!(decode(&read(s).await), values);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publishers_and_consumers() {
    let p: Arc<Broadcaster> = Arc::new(Broadcaster::new());

    let mut consumers = Vec::new();
    for _ in 0..4 {
        let s = p.subscribe(SubscribeOptions::default()).await;
        consumers.push(tokio::spawn(read(s)));
    }

    let mut publishers = Vec::new();
    for publisher in 0..3 {
        let p = Arc::clone(&p);
        publishers.push(tokio::spawn(async move {
            for i in 0..50 {
                p.publish_default(format!("{}-{}", publisher, i))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in publishers {
        handle.await.unwrap();
    }
    p.close().await;

    for handle in consumers {
        let values = decode(&handle.await.unwrap());
        assert_eq!(values.len(), 150);

        // Each publisher's own values arrive in the order it sent them
        for publisher in 0..3 {
            let prefix = format!("{}-", publisher);
            let seen: Vec<u32> = values
                .iter()
                .filter_map(|v| v.strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }
}

#[test]
fn test_blocking_consumer_thread() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let p: Broadcaster = Broadcaster::new();

    let s = runtime.block_on(p.subscribe(SubscribeOptions::default()));
    let consumer = std::thread::spawn(move || {
        s.into_blocking_iter()
            .map(|record| record.value())
            .collect::<Vec<_>>()
    });

    runtime.block_on(async {
        p.publish_default("from").await.unwrap();
        p.publish_default("a thread").await.unwrap();
        p.close().await;
    });

    assert_eq!(consumer.join().unwrap(), vec!["from", "a thread"]);
}

#[tokio::test]
async fn test_forward_to_client() {
    let p: Broadcaster = Broadcaster::new();
    let mut s = p
        .subscribe(SubscribeOptions::default().initial_data(["hello"]))
        .await;

    let (mut client, mut server) = tokio::io::duplex(1024);
    let writer = tokio::spawn(async move { s.forward(&mut server).await });

    p.publish_default("world").await.unwrap();
    p.close().await;

    assert_eq!(writer.await.unwrap().unwrap(), 2);

    let mut received = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut client, &mut received)
        .await
        .unwrap();
    assert_eq!(received, "data: hello\n\ndata: world\n\n");
}
