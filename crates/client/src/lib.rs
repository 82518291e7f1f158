//! Event-stream and REST client for a job server.
//!
//! Provides the `text/event-stream` decoder, typed server-event parsing,
//! the long-lived stream consumer with native reconnect timing, and the
//! job-creation HTTP API.

pub mod api;
pub mod client;
pub mod consumer;
pub mod events;
pub mod messages;
pub mod processor;
pub mod reconnect;
pub mod sse;

pub use api::{CreateJobResponse, JobsApi, RequestError};
pub use client::{EventStreamClient, StreamError};
pub use consumer::StreamConsumer;
pub use events::{ConnectionState, JobUpdate, StreamUpdate};
pub use reconnect::ReconnectConfig;
