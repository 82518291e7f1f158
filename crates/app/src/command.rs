//! Parsing of user input lines.

use std::str::FromStr;

use jobwatch_core::{JobType, NotificationId};

/// Help text listing every command.
pub const HELP: &str = "Commands: standard | long | extended (or 1 | 2 | 3, or create <type>), \
dismiss <id>, help, quit";

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create a job of the given type.
    Create(JobType),
    /// Dismiss a notification early.
    Dismiss(NotificationId),
    Help,
    /// Redraw without changing anything (empty line).
    Refresh,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command \"{0}\". Type help for a list of commands.")]
    Unknown(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Refresh);
        };
        let arg = words.next();
        if let Some(extra) = words.next() {
            return Err(CommandError::InvalidArgument(format!(
                "Unexpected argument \"{extra}\""
            )));
        }

        let head = head.to_ascii_lowercase();
        match (head.as_str(), arg) {
            ("1", None) => Ok(Command::Create(JobType::Standard)),
            ("2", None) => Ok(Command::Create(JobType::Long)),
            ("3", None) => Ok(Command::Create(JobType::Extended)),
            ("create", Some(name)) => parse_job_type(name).map(Command::Create),
            ("create", None) => Err(CommandError::MissingArgument("job type")),
            ("dismiss", Some(id)) => id
                .parse()
                .map(Command::Dismiss)
                .map_err(|e: jobwatch_core::CoreError| CommandError::InvalidArgument(e.to_string())),
            ("dismiss", None) => Err(CommandError::MissingArgument("notification id")),
            ("help" | "?", None) => Ok(Command::Help),
            ("quit" | "exit", None) => Ok(Command::Quit),
            (name, None) => match name.parse::<JobType>() {
                Ok(job_type) => Ok(Command::Create(job_type)),
                Err(_) => Err(CommandError::Unknown(line.trim().to_string())),
            },
            (_, Some(_)) => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}

fn parse_job_type(name: &str) -> Result<JobType, CommandError> {
    name.parse()
        .map_err(|e: jobwatch_core::CoreError| CommandError::InvalidArgument(e.to_string()))
}
