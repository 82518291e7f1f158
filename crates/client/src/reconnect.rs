//! Reconnection timing for the event stream.
//!
//! Event-stream clients reconnect on their own after a dropped connection,
//! waiting a fixed reconnection delay between attempts. The delay starts at
//! [`ReconnectConfig::default_delay`] and is replaced whenever the server
//! sends a `retry:` field. There is deliberately no backoff on top of that.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::sse::SseDecoder;

/// Reconnection delay used until the server asks for another one.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Tunable parameters for reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before each reconnection attempt unless the server overrides it.
    pub default_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            default_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// The delay to wait before the next attempt.
pub fn reconnect_delay(decoder: &SseDecoder, config: &ReconnectConfig) -> Duration {
    decoder.retry().unwrap_or(config.default_delay)
}

/// Sleep for `delay` unless `cancel` fires first.
///
/// Returns `true` if the caller should attempt to reconnect, `false` if it
/// was cancelled.
pub async fn wait_to_reconnect(delay: Duration, attempt: u32, cancel: &CancellationToken) -> bool {
    tracing::info!(
        attempt,
        delay_ms = delay.as_millis() as u64,
        "Reconnecting to event stream",
    );

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!("Reconnect cancelled");
            false
        }
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delay_is_three_seconds() {
        let config = ReconnectConfig::default();
        let decoder = SseDecoder::new();
        assert_eq!(reconnect_delay(&decoder, &config), Duration::from_secs(3));
    }

    #[test]
    fn server_retry_overrides_default() {
        let config = ReconnectConfig::default();
        let mut decoder = SseDecoder::new();
        decoder.feed(b"retry: 250\n\n");
        assert_eq!(reconnect_delay(&decoder, &config), Duration::from_millis(250));
    }

    #[test]
    fn custom_default_delay() {
        let config = ReconnectConfig {
            default_delay: Duration::from_millis(50),
        };
        assert_eq!(
            reconnect_delay(&SseDecoder::new(), &config),
            Duration::from_millis(50)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_completes_after_delay() {
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();

        assert!(wait_to_reconnect(Duration::from_secs(3), 1, &cancel).await);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn cancellation_token_stops_wait() {
        let cancel = CancellationToken::new();
        // Cancel immediately; the wait must return without sleeping.
        cancel.cancel();

        assert!(!wait_to_reconnect(Duration::from_secs(3600), 1, &cancel).await);
    }
}
