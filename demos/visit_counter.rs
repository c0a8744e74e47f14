//! Live visit feed over Server-Sent Events
//!
//! Run with: cargo run --example visit_counter [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example visit_counter                  # binds to 127.0.0.1:8080
//!   cargo run --example visit_counter 0.0.0.0:9000     # binds to 0.0.0.0:9000
//!
//! Routes:
//!   GET /                -> announces the visit to every open page
//!   GET /subscribe       -> text/event-stream of announcements
//!   GET /publish?data=x  -> publishes `x` as is
//!
//! Open the index page in several tabs to watch visits arrive in real time.
//! The HTTP handling here is deliberately minimal: one request per
//! connection, request line only, no keep-alive.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use sse_fanout::{Broadcaster, SubscribeOptions};

const INDEX_PAGE: &str = r#"<html>
  <body>
    Open this page in new tabs to see the real time visits.
    <div id="events"></div>
    <script>
    var eventSource = new EventSource('/subscribe');
    eventSource.onmessage = function(e) {
        document.getElementById('events').innerHTML += e.data + '<br>';
    }
    </script>
  </body>
</html>
"#;

async fn handle(
    socket: TcpStream,
    peer: SocketAddr,
    broadcaster: Arc<Broadcaster>,
) -> sse_fanout::Result<()> {
    let mut reader = BufReader::new(socket);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Skip the remaining headers
    let mut line = String::new();
    while reader.read_line(&mut line).await? > 2 {
        line.clear();
    }

    let mut socket = reader.into_inner();
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");

    match target.split_once('?') {
        None if target == "/" => {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            broadcaster
                .publish_default(format!("New visit from {} at {}!", peer.ip(), secs))
                .await?;
            respond(&mut socket, "200 OK", "text/html", INDEX_PAGE).await?;
        }
        None if target == "/subscribe" => {
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\n\
                      Content-Type: text/event-stream\r\n\
                      Cache-Control: no-cache\r\n\
                      Connection: close\r\n\r\n",
                )
                .await?;

            let mut subscription = broadcaster.subscribe(SubscribeOptions::default()).await;
            let records = subscription.forward(&mut socket).await?;
            tracing::debug!(peer = %peer, records = records, "Event stream finished");
        }
        Some(("/publish", query)) => {
            let data = query
                .split('&')
                .find_map(|pair| pair.strip_prefix("data="))
                .unwrap_or_default()
                .replace('+', " ");
            let queued = broadcaster.publish_default(data.as_str()).await?;
            let body = format!("Sent {} to {} subscribers", data, queued);
            respond(&mut socket, "200 OK", "text/plain", &body).await?;
        }
        _ => {
            respond(&mut socket, "404 Not Found", "text/plain", "not found").await?;
        }
    }

    Ok(())
}

async fn respond(
    socket: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &str,
) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    socket.write_all(head.as_bytes()).await?;
    socket.write_all(body.as_bytes()).await?;
    socket.shutdown().await
}

async fn accept_loop(listener: TcpListener, broadcaster: Arc<Broadcaster>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                let broadcaster = Arc::clone(&broadcaster);
                tokio::spawn(async move {
                    if let Err(e) = handle(socket, peer, broadcaster).await {
                        tracing::debug!(peer = %peer, error = %e, "Connection error");
                    }
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to accept connection");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr: SocketAddr = match std::env::args().nth(1) {
        Some(addr) => addr.parse()?,
        None => "127.0.0.1:8080".parse()?,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sse_fanout=debug".parse()?)
                .add_directive("visit_counter=debug".parse()?),
        )
        .init();

    let broadcaster: Arc<Broadcaster> = Arc::new(Broadcaster::new());
    let listener = TcpListener::bind(bind_addr).await?;

    println!("Open http://{}/ in a few tabs", bind_addr);
    tracing::info!(addr = %bind_addr, "Visit counter listening");

    tokio::select! {
        _ = accept_loop(listener, Arc::clone(&broadcaster)) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    // Ends every open event stream
    broadcaster.close().await;

    Ok(())
}
