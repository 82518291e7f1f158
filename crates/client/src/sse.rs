//! Incremental decoder for the `text/event-stream` wire format.
//!
//! Bytes arrive in arbitrary chunks from the HTTP body; [`SseDecoder::feed`]
//! buffers partial lines and returns every event completed by the chunk.
//! Field handling follows the event-stream rules used by browsers:
//!
//! - lines end in LF, CRLF or a lone CR;
//! - a leading UTF-8 BOM is skipped;
//! - lines starting with `:` are comments;
//! - `data` lines accumulate, joined with `\n`;
//! - `id` persists across events and is ignored if it contains NUL;
//! - `retry` must be ASCII digits (milliseconds);
//! - a blank line dispatches the pending event, unless it carries no data.

use std::time::Duration;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Event name used when the server omits the `event` field.
pub const DEFAULT_EVENT: &str = "message";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name (`message` if unspecified).
    pub event: String,
    /// Payload with the final newline removed.
    pub data: String,
    /// Last event id in effect when the frame was dispatched.
    pub id: Option<String>,
}

/// Stateful decoder for one connection.
///
/// The last event id and reconnection delay are connection-spanning state;
/// keep them across reconnects with [`SseDecoder::reset_stream`].
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Leading bytes of `buffer` already known to hold no line terminator.
    scanned: usize,
    bom_checked: bool,
    event: Option<String>,
    data: String,
    has_data: bool,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last event id received, to send back as `Last-Event-ID` on reconnect.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay most recently requested by the server.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Discard partial input from a dropped connection.
    ///
    /// The last event id and retry delay survive.
    pub fn reset_stream(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.bom_checked = false;
        self.event = None;
        self.data.clear();
        self.has_data = false;
    }

    /// Consume a chunk of the body and return the events it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        if !self.bom_checked {
            if self.buffer.len() < BOM.len() && BOM.starts_with(&self.buffer) {
                // Could still be the start of a BOM.
                return Vec::new();
            }
            if self.buffer.starts_with(BOM) {
                self.buffer.drain(..BOM.len());
            }
            self.bom_checked = true;
        }

        let mut frames = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;

        while let Some(offset) = self.buffer[search_from..]
            .iter()
            .position(|&b| b == b'\n' || b == b'\r')
        {
            let end = search_from + offset;
            let terminator_len = if self.buffer[end] == b'\r' {
                match self.buffer.get(end + 1).copied() {
                    Some(b'\n') => 2,
                    Some(_) => 1,
                    // CR at the end of the chunk: wait to see whether LF follows.
                    None => break,
                }
            } else {
                1
            };

            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            start = end + terminator_len;
            search_from = start;

            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        self.buffer.drain(..start);
        // A trailing CR is rescanned once the next byte arrives.
        self.scanned = match self.buffer.last() {
            Some(b'\r') => self.buffer.len() - 1,
            _ => self.buffer.len(),
        };
        frames
    }

    // ---- private helpers ----

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string()).filter(|id| !id.is_empty());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            other => {
                tracing::trace!(field = other, "Ignoring unknown event-stream field");
            }
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;

        Some(SseFrame {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: std::mem::take(&mut self.data),
            id: self.last_event_id.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
