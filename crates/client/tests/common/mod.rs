//! Shared helpers for client integration tests.

#![allow(dead_code)]

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, Sse};
use axum::Router;
use futures::{stream, Stream, StreamExt};
use tokio::sync::mpsc;

use jobwatch_client::StreamUpdate;

/// Address nothing listens on; connections are refused immediately.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}")
}

/// An SSE response that sends `events` and then stays open.
pub fn open_stream(events: Vec<Event>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(stream::iter(events.into_iter().map(Ok)).chain(stream::pending()))
}

/// A named event with a JSON payload.
pub fn event(name: &str, data: &str) -> Event {
    Event::default().event(name).data(data)
}

/// Receive the next update or fail the test after five seconds.
pub async fn next_update(rx: &mut mpsc::UnboundedReceiver<StreamUpdate>) -> StreamUpdate {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for stream update")
        .expect("update channel closed")
}

/// Wait for the update channel to close.
pub async fn expect_closed(rx: &mut mpsc::UnboundedReceiver<StreamUpdate>) {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for channel to close");
        if next.is_none() {
            return;
        }
    }
}
