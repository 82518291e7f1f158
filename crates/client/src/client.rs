//! HTTP client for the server's event stream.
//!
//! [`EventStreamClient`] holds the endpoint configuration. Call
//! [`EventStreamClient::connect`] to open a live [`EventStreamConnection`]
//! whose body is consumed by [`crate::processor::process_stream`].

use futures::Stream;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;

/// Path of the server-to-client event stream.
pub const EVENTS_PATH: &str = "/api/events";

/// MIME type the server must answer with.
pub const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Header used to resume a stream after a reconnect.
pub const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";

/// Join a base URL and an absolute path without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Connection handle factory for one server's event stream.
#[derive(Debug, Clone)]
pub struct EventStreamClient {
    http: reqwest::Client,
    events_url: String,
}

/// An open event stream.
#[derive(Debug)]
pub struct EventStreamConnection {
    response: reqwest::Response,
}

impl EventStreamConnection {
    /// The raw response body as a stream of byte chunks.
    pub fn into_byte_stream(
        self,
    ) -> impl Stream<Item = Result<impl AsRef<[u8]>, reqwest::Error>> + Unpin {
        Box::pin(self.response.bytes_stream())
    }
}

impl EventStreamClient {
    /// Create a client for the stream at `{base_url}/api/events`.
    ///
    /// The `http` client must not carry a total request timeout, since the
    /// stream stays open for the whole session.
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            events_url: endpoint(base_url, EVENTS_PATH),
        }
    }

    /// Full URL of the event stream endpoint.
    pub fn events_url(&self) -> &str {
        &self.events_url
    }

    /// Open the event stream.
    ///
    /// `last_event_id` is sent back so the server can resume where the
    /// previous connection stopped.
    pub async fn connect(
        &self,
        last_event_id: Option<&str>,
    ) -> Result<EventStreamConnection, StreamError> {
        let mut request = self
            .http
            .get(&self.events_url)
            .header(ACCEPT, EVENT_STREAM_MIME)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header(LAST_EVENT_ID_HEADER, id);
        }

        let response = request.send().await.map_err(|e| {
            StreamError::Transport(format!("Failed to connect to {}: {e}", self.events_url))
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StreamError::Rejected(format!(
                "{} answered with status {status}",
                self.events_url
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !is_event_stream(content_type) {
            return Err(StreamError::Rejected(format!(
                "{} answered with content type \"{content_type}\"",
                self.events_url
            )));
        }

        tracing::info!(url = %self.events_url, "Event stream opened");
        Ok(EventStreamConnection { response })
    }
}

/// `text/event-stream`, ignoring parameters such as `charset`.
fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(EVENT_STREAM_MIME))
}

/// Errors from opening or reading the event stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Network-level failure; the stream may be retried.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered but not with an event stream; retrying will not help.
    #[error("Stream rejected: {0}")]
    Rejected(String),
}

impl StreamError {
    /// Whether a reconnect attempt makes sense after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StreamError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint("http://localhost:8080/", EVENTS_PATH),
            "http://localhost:8080/api/events"
        );
        assert_eq!(
            endpoint("http://localhost:8080", EVENTS_PATH),
            "http://localhost:8080/api/events"
        );
    }

    #[test]
    fn event_stream_content_type_ignores_parameters() {
        assert!(is_event_stream("text/event-stream"));
        assert!(is_event_stream("text/event-stream; charset=utf-8"));
        assert!(is_event_stream("Text/Event-Stream"));
        assert!(!is_event_stream("application/json"));
        assert!(!is_event_stream(""));
    }

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(StreamError::Transport("reset".into()).is_retryable());
        assert!(!StreamError::Rejected("500".into()).is_retryable());
    }
}
