//! Session event loop.
//!
//! A [`Session`] owns the [`Dashboard`] and every source that can change it:
//! the stream consumer's update channel, the notification timers and the
//! outcomes of in-flight creation requests. All of them are drained on the
//! task that calls [`Session::next_event`], so the dashboard is never shared.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use jobwatch_client::{
    CreateJobResponse, EventStreamClient, JobsApi, RequestError, StreamConsumer, StreamUpdate,
};
use jobwatch_core::{JobType, NotificationId, Severity};

use crate::command::{Command, HELP};
use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::view::{render, CLEAR_SCREEN};

/// What [`Session::next_event`] applied to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An update from the event stream.
    Stream,
    /// The stream consumer exited and will send nothing more.
    StreamEnded,
    /// A notification timed out.
    Expired(NotificationId),
    /// A creation request finished.
    Created(JobType),
}

/// Whether the input loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Result of one creation request, sent back to the session task.
#[derive(Debug)]
struct CreationOutcome {
    job_type: JobType,
    result: Result<CreateJobResponse, RequestError>,
}

pub struct Session {
    dashboard: Dashboard,
    consumer: Option<StreamConsumer>,
    updates: mpsc::UnboundedReceiver<StreamUpdate>,
    stream_closed: bool,
    api: JobsApi,
    creations_tx: Option<mpsc::UnboundedSender<CreationOutcome>>,
    creations_rx: Option<mpsc::UnboundedReceiver<CreationOutcome>>,
    clear_screen: bool,
}

impl Session {
    /// Build the HTTP clients and open the event stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: &AppConfig) -> Result<Self, reqwest::Error> {
        // No overall timeout on the stream client: the body never ends.
        let stream_http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        let api_http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        let (updates_tx, updates) = mpsc::unbounded_channel();
        let consumer = StreamConsumer::start(
            EventStreamClient::new(stream_http, &config.api_url),
            config.reconnect(),
            updates_tx,
        );
        let (creations_tx, creations_rx) = mpsc::unbounded_channel();

        tracing::info!(api_url = %config.api_url, "Session started");

        Ok(Self {
            dashboard: Dashboard::new(),
            consumer: Some(consumer),
            updates,
            stream_closed: false,
            api: JobsApi::with_client(api_http, &config.api_url),
            creations_tx: Some(creations_tx),
            creations_rx: Some(creations_rx),
            clear_screen: false,
        })
    }

    /// Clear the terminal before each render.
    pub fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Wait for the next stream update, notification expiry or creation
    /// outcome and apply it to the dashboard.
    ///
    /// Cancel-safe. Never resolves once every source is exhausted.
    pub async fn next_event(&mut self) -> SessionEvent {
        let has_notifications = !self.dashboard.notifications().is_empty();

        tokio::select! {
            update = self.updates.recv(), if !self.stream_closed => match update {
                Some(update) => {
                    self.dashboard.apply(update);
                    SessionEvent::Stream
                }
                None => {
                    tracing::warn!("Event stream consumer has exited");
                    self.stream_closed = true;
                    SessionEvent::StreamEnded
                }
            },
            Some(id) = self.dashboard.next_expired(), if has_notifications => {
                SessionEvent::Expired(id)
            }
            Some(outcome) = recv_creation(&mut self.creations_rx) => {
                let job_type = outcome.job_type;
                self.dashboard.record_creation(job_type, outcome.result);
                SessionEvent::Created(job_type)
            }
            else => std::future::pending().await,
        }
    }

    /// Carry out one user command.
    pub fn execute(&mut self, command: Command) -> Flow {
        tracing::debug!(?command, "Executing command");
        match command {
            Command::Create(job_type) => self.create_job(job_type),
            Command::Dismiss(id) => {
                if !self.dashboard.dismiss(id) {
                    self.dashboard
                        .notify(Severity::Error, format!("Notification #{id} is not shown"));
                }
            }
            Command::Help => {
                self.dashboard.notify(Severity::Info, HELP);
            }
            Command::Refresh => {}
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Parse and execute a line of input. Parse errors become notifications.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match line.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(e) => {
                self.dashboard.notify(Severity::Error, e.to_string());
                Flow::Continue
            }
        }
    }

    /// Stop the stream, reset the dashboard and discard late creation results.
    pub async fn stop(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.stop().await;
        }
        self.stream_closed = true;
        self.creations_tx = None;
        self.creations_rx = None;
        self.dashboard.disconnect();
        tracing::info!("Session stopped");
    }

    fn create_job(&mut self, job_type: JobType) {
        if !self.dashboard.can_create_jobs() {
            tracing::info!(job_type = %job_type, "Refusing to create job while disconnected");
            self.dashboard.refuse_creation();
            return;
        }
        let Some(tx) = self.creations_tx.clone() else {
            return;
        };

        let api = self.api.clone();
        tokio::spawn(async move {
            let result = api.create_job(job_type).await;
            if tx.send(CreationOutcome { job_type, result }).is_err() {
                tracing::debug!(job_type = %job_type, "Session gone, discarding creation result");
            }
        });
    }

    async fn draw<W>(&self, output: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut frame = String::new();
        if self.clear_screen {
            frame.push_str(CLEAR_SCREEN);
        }
        frame.push_str(&render(&self.dashboard));
        frame.push_str("> ");
        output.write_all(frame.as_bytes()).await?;
        output.flush().await
    }
}

async fn recv_creation(
    rx: &mut Option<mpsc::UnboundedReceiver<CreationOutcome>>,
) -> Option<CreationOutcome> {
    match rx {
        Some(rx) => rx.recv().await,
        None => None,
    }
}

/// Drive the session until `quit`, end of input, or `shutdown` resolves.
///
/// The dashboard is redrawn to `output` after every change. The session is
/// stopped before returning.
pub async fn run<R, W, F>(
    session: &mut Session,
    input: R,
    output: &mut W,
    shutdown: F,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    session.draw(output).await?;
    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
            line = lines.next_line() => match line? {
                Some(line) => {
                    if session.handle_line(&line) == Flow::Quit {
                        break;
                    }
                }
                None => {
                    tracing::info!("Input closed");
                    break;
                }
            },
            _ = session.next_event() => {}
        }
        session.draw(output).await?;
    }

    session.stop().await;
    output.write_all(b"\n").await?;
    output.flush().await
}
