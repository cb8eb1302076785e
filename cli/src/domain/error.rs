//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::command::CommandStatus;

// ── Directory errors ──────────────────────────────────────────────────────────

/// Errors raised while resolving an instance identifier to its account and region.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Instance '{0}' does not exist in the instance directory.")]
    InstanceNotFound(String),

    #[error("Instance directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Directory record for '{id}' has an empty {field}.")]
    IncompleteRecord { id: String, field: &'static str },

    #[error("Invalid instance identifier: {0:?}")]
    InvalidInstanceId(String),
}

// ── Remote command errors ─────────────────────────────────────────────────────

/// Errors raised while submitting or polling a remote command.
#[derive(Debug, Error)]
pub enum RemoteCommandError {
    #[error("Remote command submission failed: {0}")]
    RemoteSubmissionFailed(String),

    #[error("Remote command {command_id} finished with status {status}.\n\nOutput:\n{output}")]
    RemoteExecutionFailed {
        command_id: String,
        status: CommandStatus,
        output: String,
    },

    #[error(
        "Remote command {command_id} did not finish after {attempts} polls ({}ms).",
        .waited.as_millis()
    )]
    PollTimeout {
        command_id: String,
        attempts: u32,
        waited: Duration,
    },

    #[error("Illegal command status transition: {from} -> {to}")]
    IllegalTransition {
        from: CommandStatus,
        to: CommandStatus,
    },
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Errors raised by the provisioning state machine and key checks.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Illegal provisioning transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: crate::domain::session::ProvisioningState,
        to: crate::domain::session::ProvisioningState,
    },

    #[error("Public key is not safe to embed in a remote script: {0}")]
    UnsafePublicKey(String),

    #[error("Invalid login user '{0}': must match ^[a-z_][a-z0-9_-]{{0,31}}$")]
    InvalidUser(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}

// ── Warnings ──────────────────────────────────────────────────────────────────

/// Non-fatal conditions surfaced to the operator after provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProvisionWarning {
    #[error(
        "Key expiry was not confirmed ({reason}). The installed key may persist on the instance."
    )]
    ExpiryNotConfirmed { reason: String },

    #[error("No host keys were harvested; host key checking is disabled for this session.")]
    NoHostKeys,
}
