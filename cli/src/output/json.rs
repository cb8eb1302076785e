//! JSON output helpers.
//!
//! Provides the session document printed by `--json` runs and the error
//! object printed when a `--json` run fails.

use anyhow::{Context, Result};

use crate::application::services::session::PreparedSession;
use crate::domain::{ConfigError, DirectoryError, ProvisionError, RemoteCommandError};
use crate::output::human::command_line;

/// Stable machine-readable code for an error chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<DirectoryError>() {
            return match e {
                DirectoryError::InstanceNotFound(_) => "instance_not_found",
                DirectoryError::DirectoryUnavailable(_) => "directory_unavailable",
                DirectoryError::IncompleteRecord { .. } => "incomplete_record",
                DirectoryError::InvalidInstanceId(_) => "invalid_instance_id",
            };
        }
        if let Some(e) = cause.downcast_ref::<RemoteCommandError>() {
            return match e {
                RemoteCommandError::RemoteSubmissionFailed(_) => "remote_submission_failed",
                RemoteCommandError::RemoteExecutionFailed { .. } => "remote_execution_failed",
                RemoteCommandError::PollTimeout { .. } => "poll_timeout",
                RemoteCommandError::IllegalTransition { .. } => "internal",
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "invalid_config";
        }
        if let Some(e) = cause.downcast_ref::<ProvisionError>() {
            return match e {
                ProvisionError::UnsafePublicKey(_) => "unsafe_public_key",
                ProvisionError::InvalidUser(_) => "invalid_user",
                ProvisionError::IllegalTransition { .. } => "internal",
            };
        }
    }
    "error"
}

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format a prepared session, including the exact `ssh` invocation.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_session(session: &PreparedSession) -> Result<String> {
    let obj = serde_json::json!({
        "instance": session.instance,
        "principal": session.principal,
        "fingerprint": session.fingerprint,
        "provisioning": session.provisioning,
        "launch": session.launch,
        "ssh_args": session.launch.ssh_args(),
        "command": command_line(&session.launch),
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
