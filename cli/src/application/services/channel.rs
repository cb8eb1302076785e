//! Application service: remote command channel.
//!
//! Submits scripts through the [`CommandService`] port and drives the bounded
//! poll loop. Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};

use crate::application::ports::CommandService;
use crate::domain::{CommandStatus, InstanceRef, PollPolicy, RemoteCommand, RemoteCommandError};

/// Thin wrapper over a [`CommandService`] with submit-and-poll semantics.
pub struct RemoteCommandChannel<'a, S> {
    service: &'a S,
}

impl<'a, S: CommandService> RemoteCommandChannel<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Dispatch `script` on the instance. Submission is never retried.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError::RemoteSubmissionFailed`] if the service
    /// rejects the command.
    pub async fn submit(
        &self,
        instance: &InstanceRef,
        script: &str,
        comment: &str,
    ) -> Result<RemoteCommand> {
        let command_id = self
            .service
            .send_command(instance.id(), script, comment)
            .await
            .map_err(|e| RemoteCommandError::RemoteSubmissionFailed(format!("{e:#}")))?;
        tracing::debug!(command_id, instance_id = instance.id(), "command submitted");
        Ok(RemoteCommand::submitted(command_id, instance.id()))
    }

    /// Poll until `command` reaches a terminal status and return its output.
    ///
    /// The first poll is immediate; each later poll is preceded by one
    /// `policy.interval()` sleep. At most `policy.max_attempts()` polls are
    /// issued.
    ///
    /// # Errors
    ///
    /// - [`RemoteCommandError::RemoteExecutionFailed`] on `Failure` or `TimedOut`.
    /// - [`RemoteCommandError::PollTimeout`] once the attempt budget is spent.
    /// - Any error from the status query itself.
    pub async fn await_completion(
        &self,
        command: &mut RemoteCommand,
        policy: PollPolicy,
    ) -> Result<String> {
        let started = tokio::time::Instant::now();

        for attempt in 1..=policy.max_attempts() {
            if attempt > 1 {
                tokio::time::sleep(policy.interval()).await;
            }
            let invocation = self
                .service
                .get_invocation(command.command_id(), command.instance_id())
                .await
                .with_context(|| format!("polling command {}", command.command_id()))?;
            let status = command.observe(invocation)?;
            tracing::trace!(attempt, %status, command_id = command.command_id(), "poll");

            match status {
                CommandStatus::Pending => {}
                CommandStatus::Success => {
                    return Ok(command.output().unwrap_or_default().to_string());
                }
                CommandStatus::Failure | CommandStatus::TimedOut => {
                    return Err(RemoteCommandError::RemoteExecutionFailed {
                        command_id: command.command_id().to_string(),
                        status,
                        output: command.output().unwrap_or_default().to_string(),
                    }
                    .into());
                }
            }
        }

        Err(RemoteCommandError::PollTimeout {
            command_id: command.command_id().to_string(),
            attempts: policy.max_attempts(),
            waited: started.elapsed(),
        }
        .into())
    }
}
