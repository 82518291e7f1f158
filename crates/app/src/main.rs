//! `jobwatch` -- terminal dashboard for a job server's event stream.
//!
//! Subscribes to the server's `text/event-stream` endpoint, shows live job
//! progress and queue counters, and creates jobs from commands typed on
//! stdin. Logs go to stderr so they do not interleave with the dashboard.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default                 | Description                         |
//! |------------------------|----------|-------------------------|-------------------------------------|
//! | `API_URL`              | no       | `http://localhost:8080` | Base URL of the job server          |
//! | `STREAM_RETRY_MS`      | no       | `3000`                  | Reconnect delay until `retry:`      |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`                    | Job-creation request timeout        |
//! | `CONNECT_TIMEOUT_SECS` | no       | `10`                    | TCP connect timeout                 |
//! | `RUST_LOG`             | no       | see below               | `tracing` filter                    |

use std::io::IsTerminal;

use anyhow::Context;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobwatch_app::config::AppConfig;
use jobwatch_app::session::{self, Session};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobwatch_app=info,jobwatch_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    tracing::info!(
        api_url = %config.api_url,
        stream_retry_ms = config.stream_retry.as_millis() as u64,
        "Starting jobwatch",
    );

    let mut session = Session::start(&config)
        .context("Failed to build HTTP client")?
        .with_clear_screen(std::io::stdout().is_terminal());

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    session::run(&mut session, stdin, &mut stdout, shutdown_signal())
        .await
        .context("Terminal I/O failed")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
