//! Named server events and their JSON payloads.
//!
//! The server tags each event-stream frame with an event name and sends a
//! JSON body in `data`. This module maps `(name, data)` pairs onto a
//! strongly-typed [`ServerEvent`].

use jobwatch_core::types::JobId;
use jobwatch_core::QueueStatus;
use serde::Deserialize;

/// A job advanced.
pub const EVENT_JOB_PROGRESS: &str = "job-progress";

/// A job finished successfully.
pub const EVENT_JOB_COMPLETE: &str = "job-complete";

/// A job failed.
pub const EVENT_JOB_ERROR: &str = "job-error";

/// Aggregate queue counters changed.
pub const EVENT_QUEUE_STATUS: &str = "queue-status";

/// Liveness signal; carries nothing.
pub const EVENT_HEARTBEAT: &str = "heartbeat";

/// All recognised server events.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    JobProgress(JobProgressData),
    JobComplete(JobCompleteData),
    JobError(JobErrorData),
    QueueStatus(QueueStatus),
    Heartbeat,
}

impl ServerEvent {
    /// Event name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::JobProgress(_) => EVENT_JOB_PROGRESS,
            ServerEvent::JobComplete(_) => EVENT_JOB_COMPLETE,
            ServerEvent::JobError(_) => EVENT_JOB_ERROR,
            ServerEvent::QueueStatus(_) => EVENT_QUEUE_STATUS,
            ServerEvent::Heartbeat => EVENT_HEARTBEAT,
        }
    }
}

/// Payload for `job-progress`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgressData {
    pub job_id: JobId,
    /// Raw percentage; may be fractional or out of range on the wire.
    pub progress: f64,
}

/// Payload for `job-complete`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCompleteData {
    pub job_id: JobId,
}

/// Payload for `job-error`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobErrorData {
    pub job_id: JobId,
    pub error: String,
}

/// Reasons a frame could not be turned into a [`ServerEvent`].
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The event name is not one this client listens for.
    #[error("Unknown event type: {0}")]
    UnknownEvent(String),

    /// The payload did not match the expected shape.
    #[error("Malformed {event} payload: {source}")]
    Malformed {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse an event-stream frame into a typed event.
///
/// Callers should log and drop errors; one bad frame must not end the
/// stream.
pub fn parse_event(event: &str, data: &str) -> Result<ServerEvent, MessageError> {
    match event {
        EVENT_JOB_PROGRESS => decode(EVENT_JOB_PROGRESS, data).map(ServerEvent::JobProgress),
        EVENT_JOB_COMPLETE => decode(EVENT_JOB_COMPLETE, data).map(ServerEvent::JobComplete),
        EVENT_JOB_ERROR => decode(EVENT_JOB_ERROR, data).map(ServerEvent::JobError),
        EVENT_QUEUE_STATUS => decode(EVENT_QUEUE_STATUS, data).map(ServerEvent::QueueStatus),
        EVENT_HEARTBEAT => Ok(ServerEvent::Heartbeat),
        other => Err(MessageError::UnknownEvent(other.to_string())),
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    event: &'static str,
    data: &str,
) -> Result<T, MessageError> {
    serde_json::from_str(data).map_err(|source| MessageError::Malformed { event, source })
}
