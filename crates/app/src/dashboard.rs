//! Dashboard state owned by the session task.
//!
//! All mutations funnel through [`Dashboard::apply`] (stream updates) and
//! [`Dashboard::record_creation`] (job-creation outcomes), so the state is
//! only ever touched from one place.

use chrono::Utc;

use jobwatch_client::{ConnectionState, CreateJobResponse, JobUpdate, RequestError, StreamUpdate};
use jobwatch_core::job::short_id;
use jobwatch_core::{
    CoreError, Job, JobRoster, JobType, NotificationId, NotificationQueue, QueueStatus, Severity,
};

/// Notice shown when job creation fails.
pub const CREATE_FAILED_NOTICE: &str = "Failed to create job. Check if server is running.";

/// Notice shown when the user tries to create a job without a stream.
pub const NOT_CONNECTED_NOTICE: &str = "Connect to server to create jobs";

/// Everything the view renders.
#[derive(Debug, Default)]
pub struct Dashboard {
    connected: bool,
    queue_status: Option<QueueStatus>,
    roster: JobRoster,
    notifications: NotificationQueue,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Jobs can only be created while the stream is open.
    pub fn can_create_jobs(&self) -> bool {
        self.connected
    }

    pub fn queue_status(&self) -> Option<&QueueStatus> {
        self.queue_status.as_ref()
    }

    pub fn roster(&self) -> &JobRoster {
        &self.roster
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    /// Apply one update from the stream consumer.
    pub fn apply(&mut self, update: StreamUpdate) {
        match update {
            StreamUpdate::Connection(state) => {
                self.connected = state == ConnectionState::Connected;
                tracing::info!(connected = self.connected, "Connection state changed");
            }
            StreamUpdate::Job(JobUpdate::Progress { job_id, progress }) => {
                self.roster.update_progress(&job_id, progress);
            }
            StreamUpdate::Job(JobUpdate::Completed { job_id }) => {
                self.roster.update_complete(&job_id);
            }
            StreamUpdate::Job(JobUpdate::Failed { job_id, error }) => {
                tracing::warn!(job_id = %job_id, error = %error, "Job failed");
                self.roster.update_error(&job_id);
            }
            StreamUpdate::QueueStatus(status) => {
                self.queue_status = Some(status);
            }
            StreamUpdate::Notify { severity, text } => {
                self.notifications.push(severity, text);
            }
        }
    }

    /// Record the outcome of a job-creation request.
    pub fn record_creation(
        &mut self,
        job_type: JobType,
        outcome: Result<CreateJobResponse, RequestError>,
    ) {
        match outcome {
            Ok(created) => {
                let text = format!("Job created: {}", short_id(&created.job_id));
                let job = Job::new(created.job_id, job_type, created.status, Utc::now());
                match self.roster.add(job) {
                    Ok(()) => {}
                    Err(CoreError::DuplicateJob(job_id)) => {
                        tracing::warn!(job_id = %job_id, "Server returned an id already on the roster");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not add job to roster");
                    }
                }
                self.notifications.push(Severity::Info, text);
            }
            Err(e) => {
                tracing::error!(job_type = %job_type, error = %e, "Error creating job");
                self.notifications.push(Severity::Error, CREATE_FAILED_NOTICE);
            }
        }
    }

    /// Tell the user a job cannot be created right now.
    pub fn refuse_creation(&mut self) {
        self.notifications.push(Severity::Error, NOT_CONNECTED_NOTICE);
    }

    /// Show an arbitrary message.
    pub fn notify(&mut self, severity: Severity, text: impl Into<String>) -> NotificationId {
        self.notifications.push(severity, text)
    }

    /// Dismiss a notification before it expires.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        self.notifications.expire(id)
    }

    /// Wait for the next notification to time out and remove it.
    ///
    /// Resolves to `None` straight away when nothing is visible.
    pub async fn next_expired(&mut self) -> Option<NotificationId> {
        self.notifications.next_expired().await
    }

    /// Teardown: the stream is gone and no notification timer may fire.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.notifications.clear();
    }
}
