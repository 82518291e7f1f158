//! Lifecycle of the event-stream subscription.
//!
//! [`StreamConsumer::start`] spawns a single task that owns the one open
//! connection: connect -> process events -> wait -> reconnect, until
//! [`StreamConsumer::stop`] is called or the server rejects the stream.
//! Every state change is sent as a [`StreamUpdate`] over the channel given
//! at start-up; the consumer itself holds no dashboard state.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::EventStreamClient;
use crate::events::{connected_updates, ConnectionState, StreamUpdate};
use crate::processor::{process_stream, StreamEnd};
use crate::reconnect::{reconnect_delay, wait_to_reconnect, ReconnectConfig};
use crate::sse::SseDecoder;

/// How long [`StreamConsumer::stop`] waits for the task to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the running stream task.
///
/// Dropping the handle cancels the task as well; prefer [`stop`](Self::stop)
/// to also wait for it to finish.
pub struct StreamConsumer {
    task_handle: Option<tokio::task::JoinHandle<()>>,
    cancel: CancellationToken,
}

impl StreamConsumer {
    /// Open the stream and keep it open until stopped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        client: EventStreamClient,
        config: ReconnectConfig,
        updates: mpsc::UnboundedSender<StreamUpdate>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let task_handle = tokio::spawn(async move {
            tracing::info!(url = %client.events_url(), "Starting event stream task");
            run_stream_loop(&client, &config, &updates, &task_cancel).await;
            tracing::info!("Event stream task exited");
        });

        Self {
            task_handle: Some(task_handle),
            cancel,
        }
    }

    /// Whether the stream task is still alive.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Close the connection and wait for the task to exit.
    ///
    /// No update is sent after this returns.
    pub async fn stop(mut self) {
        tracing::info!("Stopping event stream");
        self.cancel.cancel();
        if let Some(handle) = self.task_handle.take() {
            if tokio::time::timeout(STOP_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Event stream task did not exit in time");
            }
        }
    }
}

impl Drop for StreamConsumer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Core loop: connect -> process -> reconnect.
///
/// Runs until cancelled, until the update receiver goes away, or until the
/// server answers with something other than an event stream.
async fn run_stream_loop(
    client: &EventStreamClient,
    config: &ReconnectConfig,
    updates: &mpsc::UnboundedSender<StreamUpdate>,
    cancel: &CancellationToken,
) {
    let mut decoder = SseDecoder::new();
    let mut attempt = 0u32;

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = client.connect(decoder.last_event_id()) => result,
        };

        match result {
            Ok(conn) => {
                attempt = 0;
                decoder.reset_stream();
                for update in connected_updates() {
                    if updates.send(update).is_err() {
                        return;
                    }
                }

                let end = tokio::select! {
                    _ = cancel.cancelled() => return,
                    end = process_stream(conn.into_byte_stream(), &mut decoder, updates) => end,
                };
                if end == StreamEnd::ReceiverDropped {
                    return;
                }
                tracing::warn!(reason = ?end, "Event stream lost");
                if !send_disconnected(updates) {
                    return;
                }
            }
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "Event stream connection failed");
                if !send_disconnected(updates) {
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Event stream rejected, giving up");
                send_disconnected(updates);
                return;
            }
        }

        attempt += 1;
        let delay = reconnect_delay(&decoder, config);
        if !wait_to_reconnect(delay, attempt, cancel).await {
            return;
        }
    }
}

/// Returns `false` once nobody is listening.
fn send_disconnected(updates: &mpsc::UnboundedSender<StreamUpdate>) -> bool {
    updates
        .send(StreamUpdate::Connection(ConnectionState::Disconnected))
        .is_ok()
}
