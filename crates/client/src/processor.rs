//! Event-stream processing loop.
//!
//! Reads byte chunks from an open stream, decodes them into frames with
//! [`SseDecoder`], parses each frame into a [`ServerEvent`] and forwards
//! the resulting [`StreamUpdate`]s over the update channel.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::events::{translate, StreamUpdate};
use crate::messages::{parse_event, MessageError};
use crate::sse::{SseDecoder, SseFrame};

/// Why [`process_stream`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server closed the body.
    Closed,
    /// Reading the body failed.
    Failed(String),
    /// Nobody is listening for updates any more.
    ReceiverDropped,
}

/// Process chunks from an event stream until it ends.
///
/// Frames are handled strictly in arrival order. Malformed and unknown
/// events are logged and skipped; they never end the loop.
pub async fn process_stream<S, B, E>(
    mut body: S,
    decoder: &mut SseDecoder,
    updates: &mpsc::UnboundedSender<StreamUpdate>,
) -> StreamEnd
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(error = %e, "Event stream receive error");
                return StreamEnd::Failed(e.to_string());
            }
        };

        for frame in decoder.feed(chunk.as_ref()) {
            for update in handle_frame(&frame) {
                if updates.send(update).is_err() {
                    tracing::debug!("Update receiver dropped, stopping stream processing");
                    return StreamEnd::ReceiverDropped;
                }
            }
        }
    }

    tracing::info!("Event stream closed by server");
    StreamEnd::Closed
}

/// Turn one decoded frame into zero or more updates.
fn handle_frame(frame: &SseFrame) -> Vec<StreamUpdate> {
    match parse_event(&frame.event, &frame.data) {
        Ok(event) => {
            tracing::trace!(event = event.name(), id = ?frame.id, "Server event");
            translate(event)
        }
        Err(MessageError::UnknownEvent(name)) => {
            tracing::debug!(event = %name, "Ignoring unrecognised server event");
            Vec::new()
        }
        Err(e @ MessageError::Malformed { .. }) => {
            tracing::error!(
                error = %e,
                event = %frame.event,
                raw_data = %frame.data,
                "Dropping malformed server event",
            );
            Vec::new()
        }
    }
}
