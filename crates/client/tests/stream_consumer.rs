//! Integration tests for [`StreamConsumer`] against an in-process SSE server.
//!
//! Each test serves `/api/events` from a local axum router and checks the
//! updates the consumer emits: connection lifecycle, event translation,
//! reconnect behaviour and teardown.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use futures::stream;
use tokio::sync::mpsc;

use jobwatch_client::events::CONNECTED_NOTICE;
use jobwatch_client::{
    ConnectionState, EventStreamClient, JobUpdate, ReconnectConfig, StreamConsumer, StreamUpdate,
};
use jobwatch_core::{QueueStatus, Severity};

use common::{event, expect_closed, next_update, open_stream, spawn_server, UNREACHABLE_URL};

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        default_delay: Duration::from_millis(50),
    }
}

fn start(base_url: &str) -> (StreamConsumer, mpsc::UnboundedReceiver<StreamUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let client = EventStreamClient::new(reqwest::Client::new(), base_url);
    (StreamConsumer::start(client, fast_reconnect(), tx), rx)
}

fn assert_connected_notice(update: &StreamUpdate) {
    assert_eq!(
        *update,
        StreamUpdate::Notify {
            severity: Severity::Info,
            text: CONNECTED_NOTICE.to_string(),
        }
    );
}

// ---------------------------------------------------------------------------
// Test: opening the stream reports connected plus exactly one info notice
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_reports_connected_then_forwards_events() {
    let app = Router::new().route(
        "/api/events",
        get(|| async {
            open_stream(vec![
                event("queue-status", r#"{"pending":3,"processing":"xyz","completed":7}"#),
                event("heartbeat", "{}"),
                event("job-progress", r#"{"jobId":"abc123","progress":42}"#),
            ])
        }),
    );
    let base = spawn_server(app).await;
    let (consumer, mut rx) = start(&base);

    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Connection(ConnectionState::Connected)
    );
    assert_connected_notice(&next_update(&mut rx).await);
    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::QueueStatus(QueueStatus {
            pending: 3,
            processing: Some("xyz".into()),
            completed: 7,
        })
    );
    // The heartbeat produces nothing, so the progress update comes next.
    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Job(JobUpdate::Progress {
            job_id: "abc123".into(),
            progress: 42,
        })
    );

    consumer.stop().await;
}

// ---------------------------------------------------------------------------
// Test: stop() ends delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_closes_the_update_channel() {
    let app = Router::new().route("/api/events", get(|| async { open_stream(Vec::new()) }));
    let base = spawn_server(app).await;
    let (consumer, mut rx) = start(&base);

    next_update(&mut rx).await;
    next_update(&mut rx).await;
    assert!(consumer.is_running());

    consumer.stop().await;

    assert!(rx.recv().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: malformed payloads are dropped without ending the stream
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_event_is_dropped() {
    let app = Router::new().route(
        "/api/events",
        get(|| async {
            open_stream(vec![
                event("job-error", "{not json"),
                event("job-complete", r#"{"jobId":"abc123"}"#),
            ])
        }),
    );
    let base = spawn_server(app).await;
    let (consumer, mut rx) = start(&base);

    next_update(&mut rx).await;
    next_update(&mut rx).await;
    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Job(JobUpdate::Completed {
            job_id: "abc123".into(),
        })
    );
    assert_matches!(
        next_update(&mut rx).await,
        StreamUpdate::Notify { severity: Severity::Success, text } if text == "Job abc123 completed!"
    );

    consumer.stop().await;
}

// ---------------------------------------------------------------------------
// Test: a closed stream reconnects and resumes with Last-Event-ID
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconnects_with_last_event_id() {
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in_handler = Arc::clone(&seen);

    let app = Router::new().route(
        "/api/events",
        get(move |headers: HeaderMap| {
            let seen = Arc::clone(&seen_in_handler);
            async move {
                let last_id = headers
                    .get("last-event-id")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                seen.lock().unwrap().push(last_id);

                // Finite stream: the body ends after one event.
                let events = vec![Event::default()
                    .id("7")
                    .event("job-progress")
                    .data(r#"{"jobId":"a","progress":10}"#)];
                Sse::new(stream::iter(
                    events
                        .into_iter()
                        .map(Ok::<_, std::convert::Infallible>),
                ))
            }
        }),
    );
    let base = spawn_server(app).await;
    let (consumer, mut rx) = start(&base);

    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Connection(ConnectionState::Connected)
    );
    assert_connected_notice(&next_update(&mut rx).await);
    assert_matches!(next_update(&mut rx).await, StreamUpdate::Job(JobUpdate::Progress { .. }));
    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Connection(ConnectionState::Disconnected)
    );
    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Connection(ConnectionState::Connected)
    );
    assert_connected_notice(&next_update(&mut rx).await);

    consumer.stop().await;

    let seen = seen.lock().unwrap();
    assert!(seen.len() >= 2);
    assert_eq!(seen[0], None);
    assert_eq!(seen[1].as_deref(), Some("7"));
}

// ---------------------------------------------------------------------------
// Test: a non-200 answer fails the stream permanently
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_stops_the_consumer() {
    let app = Router::new().route(
        "/api/events",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base = spawn_server(app).await;
    let (consumer, mut rx) = start(&base);

    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Connection(ConnectionState::Disconnected)
    );
    expect_closed(&mut rx).await;

    consumer.stop().await;
}

// ---------------------------------------------------------------------------
// Test: a non-event-stream body fails the stream permanently
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_content_type_stops_the_consumer() {
    let app = Router::new().route("/api/events", get(|| async { "plain text" }));
    let base = spawn_server(app).await;
    let (consumer, mut rx) = start(&base);

    assert_eq!(
        next_update(&mut rx).await,
        StreamUpdate::Connection(ConnectionState::Disconnected)
    );
    expect_closed(&mut rx).await;

    consumer.stop().await;
}

// ---------------------------------------------------------------------------
// Test: an unreachable server is retried
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_server_keeps_retrying() {
    let (consumer, mut rx) = start(UNREACHABLE_URL);

    for _ in 0..2 {
        assert_eq!(
            next_update(&mut rx).await,
            StreamUpdate::Connection(ConnectionState::Disconnected)
        );
    }
    assert!(consumer.is_running());

    consumer.stop().await;
    assert!(rx.recv().await.is_none());
}
