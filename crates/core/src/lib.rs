//! Domain types and in-memory state containers for the jobwatch client.
//!
//! Everything in this crate is runtime-agnostic state: the [`JobRoster`]
//! of jobs created during a session and the self-expiring
//! [`NotificationQueue`]. Network concerns live in `jobwatch-client`.

pub mod error;
pub mod job;
pub mod notification;
pub mod roster;
pub mod types;

pub use error::CoreError;
pub use job::{Job, JobStatus, JobType, QueueStatus};
pub use notification::{Notification, NotificationId, NotificationQueue, Severity};
pub use roster::JobRoster;
