//! State updates emitted by the stream consumer.
//!
//! The consumer interprets raw [`ServerEvent`]s and connection lifecycle
//! changes into the small set of mutations the dashboard applies: roster
//! changes, queue snapshots, connection state and notifications.
//!
//! [`ServerEvent`]: crate::messages::ServerEvent

use jobwatch_core::job::{clamp_progress, short_id};
use jobwatch_core::types::JobId;
use jobwatch_core::{QueueStatus, Severity};

use crate::messages::ServerEvent;

/// Text of the notification shown whenever the stream (re)opens.
pub const CONNECTED_NOTICE: &str = "Connected to server";

/// Whether the event stream is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// A change to a single job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobUpdate {
    Progress { job_id: JobId, progress: u8 },
    Completed { job_id: JobId },
    Failed { job_id: JobId, error: String },
}

/// One mutation for the dashboard to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    Connection(ConnectionState),
    Job(JobUpdate),
    QueueStatus(QueueStatus),
    Notify { severity: Severity, text: String },
}

impl StreamUpdate {
    fn notify(severity: Severity, text: impl Into<String>) -> Self {
        StreamUpdate::Notify {
            severity,
            text: text.into(),
        }
    }
}

/// Updates emitted when a connection opens.
pub fn connected_updates() -> Vec<StreamUpdate> {
    vec![
        StreamUpdate::Connection(ConnectionState::Connected),
        StreamUpdate::notify(Severity::Info, CONNECTED_NOTICE),
    ]
}

/// Translate a server event into dashboard updates, in application order.
pub fn translate(event: ServerEvent) -> Vec<StreamUpdate> {
    match event {
        ServerEvent::JobProgress(data) => vec![StreamUpdate::Job(JobUpdate::Progress {
            job_id: data.job_id,
            progress: clamp_progress(data.progress),
        })],
        ServerEvent::JobComplete(data) => {
            let text = format!("Job {} completed!", short_id(&data.job_id));
            vec![
                StreamUpdate::Job(JobUpdate::Completed {
                    job_id: data.job_id,
                }),
                StreamUpdate::notify(Severity::Success, text),
            ]
        }
        ServerEvent::JobError(data) => {
            let text = format!("Job {} failed: {}", data.job_id, data.error);
            vec![
                StreamUpdate::Job(JobUpdate::Failed {
                    job_id: data.job_id,
                    error: data.error,
                }),
                StreamUpdate::notify(Severity::Error, text),
            ]
        }
        ServerEvent::QueueStatus(status) => vec![StreamUpdate::QueueStatus(status)],
        ServerEvent::Heartbeat => Vec::new(),
    }
}
