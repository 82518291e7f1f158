//! Ordered, copy-on-write collection of the session's jobs.
//!
//! The newest job is always first. Records are never edited in place:
//! every mutation builds a replacement [`Job`] and swaps it into the
//! backing vector, cloning the vector first when a [`snapshot`] is still
//! held elsewhere. Observers holding a snapshot therefore never see a
//! half-applied update.
//!
//! [`snapshot`]: JobRoster::snapshot

use std::sync::Arc;

use crate::error::CoreError;
use crate::job::{Job, JobStatus, MAX_PROGRESS};

/// The session's jobs, most recently created first.
#[derive(Debug, Clone, Default)]
pub struct JobRoster {
    jobs: Arc<Vec<Job>>,
}

impl JobRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Look up a job by id.
    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.job_id == job_id)
    }

    /// Iterate jobs newest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }

    /// A cheap, immutable view of the current roster.
    pub fn snapshot(&self) -> Arc<Vec<Job>> {
        Arc::clone(&self.jobs)
    }

    /// Prepend a newly created job.
    ///
    /// Job ids are unique; adding an id that is already present leaves the
    /// roster untouched and returns [`CoreError::DuplicateJob`].
    pub fn add(&mut self, job: Job) -> Result<(), CoreError> {
        if self.get(&job.job_id).is_some() {
            return Err(CoreError::DuplicateJob(job.job_id));
        }
        Arc::make_mut(&mut self.jobs).insert(0, job);
        Ok(())
    }

    /// Record the latest progress value for a job.
    ///
    /// Unknown ids are ignored, and so are completed jobs, which stay at
    /// full progress. Failed jobs still take new values.
    /// Returns `true` if a record was replaced.
    pub fn update_progress(&mut self, job_id: &str, progress: u8) -> bool {
        self.replace(job_id, |job| {
            if job.status == JobStatus::Completed {
                return None;
            }
            Some(Job {
                progress: progress.min(MAX_PROGRESS),
                ..job.clone()
            })
        })
    }

    /// Mark a job completed at full progress, whatever its previous state.
    pub fn update_complete(&mut self, job_id: &str) -> bool {
        self.replace(job_id, |job| {
            Some(Job {
                status: JobStatus::Completed,
                progress: MAX_PROGRESS,
                ..job.clone()
            })
        })
    }

    /// Mark a job failed. Progress keeps its last known value.
    pub fn update_error(&mut self, job_id: &str) -> bool {
        self.replace(job_id, |job| {
            Some(Job {
                status: JobStatus::Error,
                ..job.clone()
            })
        })
    }

    // ---- private helpers ----

    /// Swap the record for `job_id` with the one produced by `next`.
    ///
    /// `next` returning `None` means "leave it alone".
    fn replace(&mut self, job_id: &str, next: impl FnOnce(&Job) -> Option<Job>) -> bool {
        let Some(index) = self.jobs.iter().position(|job| job.job_id == job_id) else {
            tracing::debug!(job_id, "Update for unknown job ignored");
            return false;
        };
        let Some(replacement) = next(&self.jobs[index]) else {
            return false;
        };
        if replacement == self.jobs[index] {
            return false;
        }
        Arc::make_mut(&mut self.jobs)[index] = replacement;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
