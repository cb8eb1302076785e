//! Remote command lifecycle: status enum, monotone transitions, poll policy.
//!
//! Pure functions only, no I/O, no async.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::domain::error::RemoteCommandError;

/// Document that runs an arbitrary shell script on the target instance.
pub const RUN_SHELL_SCRIPT_DOCUMENT: &str = "AWS-RunShellScript";

/// Maximum length the command service accepts for the audit comment.
pub const MAX_COMMENT_LEN: usize = 100;

/// Execution status of a remote command.
///
/// `Pending` is the only non-terminal state. Every other state is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Success,
    Failure,
    TimedOut,
}

impl CommandStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Checks that moving from `self` to `next` keeps the status monotone.
    ///
    /// Allowed: `Pending -> anything`, and any state to itself.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError::IllegalTransition`] when a terminal
    /// state would change or regress.
    pub fn transition(self, next: Self) -> Result<Self, RemoteCommandError> {
        if self == next || self == Self::Pending {
            Ok(next)
        } else {
            Err(RemoteCommandError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::TimedOut => "TimedOut",
        };
        f.write_str(s)
    }
}

/// One poll observation returned by the command service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub status: CommandStatus,
    /// Captured standard output, present once the command is terminal.
    pub stdout: Option<String>,
}

impl Invocation {
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: CommandStatus::Pending,
            stdout: None,
        }
    }
}

/// In-memory record of a submitted remote command.
///
/// Status only moves through [`RemoteCommand::observe`], which rejects
/// non-monotone transitions.
#[derive(Debug, Clone)]
pub struct RemoteCommand {
    command_id: String,
    instance_id: String,
    status: CommandStatus,
    output: Option<String>,
}

impl RemoteCommand {
    #[must_use]
    pub fn submitted(command_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            instance_id: instance_id.into(),
            status: CommandStatus::Pending,
            output: None,
        }
    }

    #[must_use]
    pub fn command_id(&self) -> &str {
        &self.command_id
    }

    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    #[must_use]
    pub fn status(&self) -> CommandStatus {
        self.status
    }

    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Applies a poll observation.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError::IllegalTransition`] if the observation
    /// would move a terminal command to a different status.
    pub fn observe(&mut self, invocation: Invocation) -> Result<CommandStatus, RemoteCommandError> {
        self.status = self.status.transition(invocation.status)?;
        if invocation.stdout.is_some() {
            self.output = invocation.stdout;
        }
        Ok(self.status)
    }
}

/// Bounded polling policy. Unbounded polling is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 60,
        }
    }
}

impl PollPolicy {
    /// Builds a policy; `max_attempts` is clamped to at least one poll.
    #[must_use]
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Upper bound on time spent waiting between polls.
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Truncates an audit comment to the command service's length limit,
/// respecting UTF-8 boundaries.
#[must_use]
pub fn audit_comment(principal: &str) -> String {
    let full = format!("ssm-ssh:{principal}");
    if full.len() <= MAX_COMMENT_LEN {
        return full;
    }
    let mut end = MAX_COMMENT_LEN;
    while !full.is_char_boundary(end) {
        end -= 1;
    }
    full[..end].to_string()
}
