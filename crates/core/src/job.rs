//! Job records, job types and the server's queue snapshot.
//!
//! Wire names match the server's JSON (`"standard"`, `"processing"`,
//! `{"pending": .., "processing": .., "completed": ..}`).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Progress value of a finished job.
pub const MAX_PROGRESS: u8 = 100;

/// Number of characters of a job id shown in user-facing text.
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JobType
// ---------------------------------------------------------------------------

/// The kinds of job the server knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Standard,
    Long,
    Extended,
}

impl JobType {
    /// Every job type, in menu order.
    pub const ALL: [JobType; 3] = [JobType::Standard, JobType::Long, JobType::Extended];

    /// Wire name sent in the `type` field of a creation request.
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Standard => "standard",
            JobType::Long => "long",
            JobType::Extended => "extended",
        }
    }

    /// How long the server nominally takes to run a job of this type.
    pub fn nominal_duration(self) -> Duration {
        match self {
            JobType::Standard => Duration::from_secs(5),
            JobType::Long => Duration::from_secs(10),
            JobType::Extended => Duration::from_secs(15),
        }
    }

    /// Menu label, e.g. `Standard (5s)`.
    pub fn label(self) -> String {
        let name = match self {
            JobType::Standard => "Standard",
            JobType::Long => "Long",
            JobType::Extended => "Extended",
        };
        format!("{name} ({}s)", self.nominal_duration().as_secs())
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = CoreError;

    /// Case-insensitive parse of a wire name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown job type \"{wanted}\" (expected standard, long or extended)"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a job as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A job created during this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub job_id: JobId,
    pub job_type: JobType,
    pub status: JobStatus,
    /// Percentage in `0..=100`.
    pub progress: u8,
    /// Client clock at the moment the creation response arrived.
    pub created_at: Timestamp,
}

impl Job {
    /// Build a freshly created job. Progress always starts at zero; only
    /// stream updates move it.
    pub fn new(job_id: JobId, job_type: JobType, status: JobStatus, created_at: Timestamp) -> Self {
        Self {
            job_id,
            job_type,
            status,
            progress: 0,
            created_at,
        }
    }

    /// First [`SHORT_ID_LEN`] characters of the job id.
    pub fn short_id(&self) -> &str {
        short_id(&self.job_id)
    }
}

/// Truncate an id to [`SHORT_ID_LEN`] characters without splitting a
/// multi-byte character.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Convert a raw progress number from the wire into `0..=100`.
///
/// Fractions are rounded; NaN maps to zero.
pub fn clamp_progress(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.round().clamp(0.0, f64::from(MAX_PROGRESS)) as u8
}

// ---------------------------------------------------------------------------
// QueueStatus
// ---------------------------------------------------------------------------

/// Aggregate queue counters pushed by the server. Each snapshot replaces the
/// previous one entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub pending: u64,
    /// Id of the job currently running, if any.
    #[serde(default)]
    pub processing: Option<JobId>,
    pub completed: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        chrono::Utc::now()
    }

    // -- JobType --------------------------------------------------------------

    #[test]
    fn job_type_parses_case_insensitively() {
        assert_eq!("standard".parse::<JobType>().unwrap(), JobType::Standard);
        assert_eq!("LONG".parse::<JobType>().unwrap(), JobType::Long);
        assert_eq!(" Extended ".parse::<JobType>().unwrap(), JobType::Extended);
    }

    #[test]
    fn job_type_rejects_unknown_name() {
        let err = "huge".parse::<JobType>().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(err.to_string().contains("huge"));
    }

    #[test]
    fn job_type_labels_carry_duration() {
        assert_eq!(JobType::Standard.label(), "Standard (5s)");
        assert_eq!(JobType::Long.label(), "Long (10s)");
        assert_eq!(JobType::Extended.label(), "Extended (15s)");
    }

    #[test]
    fn job_type_serializes_lowercase() {
        let json = serde_json::to_string(&JobType::Extended).unwrap();
        assert_eq!(json, "\"extended\"");
    }

    // -- JobStatus ------------------------------------------------------------

    #[test]
    fn job_status_deserializes_wire_names() {
        let status: JobStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, JobStatus::Processing);
        assert!(serde_json::from_str::<JobStatus>("\"queued\"").is_err());
    }

    // -- Job ------------------------------------------------------------------

    #[test]
    fn new_job_starts_at_zero_progress() {
        let job = Job::new("abc123".into(), JobType::Standard, JobStatus::Pending, now());
        assert_eq!(job.progress, 0);
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn new_job_starts_at_zero_whatever_the_reported_status() {
        let job = Job::new("abc123".into(), JobType::Long, JobStatus::Completed, now());
        assert_eq!(job.progress, 0);
        assert_eq!(job.status, JobStatus::Completed);
    }

    // -- short_id -------------------------------------------------------------

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
    }

    #[test]
    fn short_id_keeps_short_ids() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id(""), "");
    }

    #[test]
    fn short_id_respects_char_boundaries() {
        assert_eq!(short_id("ééééééééé"), "éééééééé");
    }

    // -- clamp_progress -------------------------------------------------------

    #[test]
    fn clamp_progress_bounds() {
        assert_eq!(clamp_progress(42.0), 42);
        assert_eq!(clamp_progress(42.6), 43);
        assert_eq!(clamp_progress(-5.0), 0);
        assert_eq!(clamp_progress(250.0), 100);
        assert_eq!(clamp_progress(f64::NAN), 0);
    }

    // -- QueueStatus ----------------------------------------------------------

    #[test]
    fn queue_status_accepts_null_and_missing_processing() {
        let with_null: QueueStatus =
            serde_json::from_str(r#"{"pending":1,"processing":null,"completed":2}"#).unwrap();
        assert_eq!(with_null.processing, None);

        let missing: QueueStatus =
            serde_json::from_str(r#"{"pending":1,"completed":2}"#).unwrap();
        assert_eq!(missing.processing, None);

        let running: QueueStatus =
            serde_json::from_str(r#"{"pending":3,"processing":"xyz","completed":7}"#).unwrap();
        assert_eq!(running.processing.as_deref(), Some("xyz"));
    }
}
