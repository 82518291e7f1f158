//! Plain-text rendering of the dashboard.

use chrono::Local;

use jobwatch_core::job::{short_id, MAX_PROGRESS};
use jobwatch_core::{Job, JobType, Notification, QueueStatus};

use crate::dashboard::Dashboard;

/// Width of the progress bar in cells.
pub const PROGRESS_BAR_WIDTH: usize = 20;

/// ANSI sequence that clears the screen and homes the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const TITLE: &str = "SSE Job Queue Demo";

/// Render the whole dashboard.
pub fn render(dashboard: &Dashboard) -> String {
    let connection = if dashboard.is_connected() {
        "Connected"
    } else {
        "Disconnected"
    };
    let mut lines = vec![format!("{TITLE}  [{connection}]"), String::new()];

    if let Some(status) = dashboard.queue_status() {
        lines.push(queue_status_line(status));
        lines.push(String::new());
    }

    lines.extend(menu_lines(dashboard.can_create_jobs()));
    lines.push(String::new());

    lines.push("Jobs".to_string());
    if dashboard.roster().is_empty() {
        lines.push("  No jobs yet. Create one above!".to_string());
    } else {
        lines.extend(dashboard.roster().iter().map(job_line));
    }

    let messages = dashboard.notifications().messages();
    if !messages.is_empty() {
        lines.push(String::new());
        lines.extend(messages.iter().map(notification_line));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn queue_status_line(status: &QueueStatus) -> String {
    let processing = status.processing.as_deref().map(short_id).unwrap_or("None");
    format!(
        "Queue  Pending: {}  Processing: {}  Completed: {}",
        status.pending, processing, status.completed
    )
}

fn menu_lines(enabled: bool) -> Vec<String> {
    let mut lines = vec!["Create job".to_string()];
    lines.extend(
        JobType::ALL
            .iter()
            .enumerate()
            .map(|(index, job_type)| format!("  [{}] {}", index + 1, job_type.label())),
    );
    if !enabled {
        lines.push("  (connect to server to create jobs)".to_string());
    }
    lines
}

fn job_line(job: &Job) -> String {
    let created = job.created_at.with_timezone(&Local).format("%H:%M:%S");
    format!(
        "  {:<8}  {:<8}  {:<10}  {}  {}",
        job.short_id(),
        job.job_type.as_str(),
        job.status.as_str(),
        created,
        progress_bar(job.progress),
    )
}

fn notification_line(message: &Notification) -> String {
    format!("  #{} [{}] {}", message.id, message.severity, message.text)
}

/// A fixed-width bar followed by the percentage, e.g. `[#####-----]  50%`.
pub fn progress_bar(progress: u8) -> String {
    let progress = progress.min(MAX_PROGRESS);
    let filled = usize::from(progress) * PROGRESS_BAR_WIDTH / usize::from(MAX_PROGRESS);
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        progress
    )
}
