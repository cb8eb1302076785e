//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;

use crate::domain::{
    DirectoryResponse, InstanceRef, Invocation, KeyPair, LaunchSpec, SsmSshConfig,
};

// ── Directory Port ────────────────────────────────────────────────────────────

/// Looks up instance records by name.
#[allow(async_fn_in_trait)]
pub trait InstanceDirectory {
    /// Issue one lookup request for `instance_id`.
    ///
    /// # Errors
    ///
    /// Transport failures must surface as
    /// [`crate::domain::DirectoryError::DirectoryUnavailable`].
    async fn lookup(&self, instance_id: &str) -> Result<DirectoryResponse>;
}

// ── Remote Command Ports ──────────────────────────────────────────────────────

/// The remote command service: submit a script, poll its invocation.
#[allow(async_fn_in_trait)]
pub trait CommandService {
    /// Dispatch `script` as a privileged shell command on `instance_id`.
    /// Returns the service's command id without waiting for execution.
    async fn send_command(&self, instance_id: &str, script: &str, comment: &str)
    -> Result<String>;

    /// Fetch the current status of a command on `instance_id`.
    ///
    /// An invocation the service does not know about yet is reported as
    /// pending, not as an error.
    async fn get_invocation(&self, command_id: &str, instance_id: &str) -> Result<Invocation>;
}

/// Identifies the principal on whose behalf commands are submitted.
#[allow(async_fn_in_trait)]
pub trait PrincipalSource {
    async fn principal(&self) -> Result<String>;
}

/// Opens a credentialed session against the cloud account that owns an
/// instance. Region and credential profile come from the resolved instance.
#[allow(async_fn_in_trait)]
pub trait CloudConnector {
    type Session: CommandService + PrincipalSource;

    async fn connect(&self, instance: &InstanceRef) -> Result<Self::Session>;
}

// ── Key Material Port ─────────────────────────────────────────────────────────

/// Generates one-time session keypairs.
#[allow(async_fn_in_trait)]
pub trait KeyGenerator {
    /// Generate a keypair whose public line carries `marker` as its comment.
    async fn generate(&self, marker: &str) -> Result<KeyPair>;
}

// ── Local Artifacts Port ──────────────────────────────────────────────────────

/// Writes session artifacts to the local filesystem.
pub trait LocalArtifactWriter {
    /// Directory holding the artifacts of one session key on `instance_id`.
    ///
    /// Distinct markers yield distinct directories, so concurrent sessions
    /// to the same instance never share a key file.
    fn session_dir(&self, instance_id: &str, marker: &str) -> PathBuf;

    /// Write `contents` to `path` readable by the owner only, creating the
    /// parent directory (owner-only) as needed.
    fn write_private(&self, path: &Path, contents: &str) -> Result<()>;
}

// ── Hand-off Port ─────────────────────────────────────────────────────────────

/// Starts the external interactive session.
#[allow(async_fn_in_trait)]
pub trait TunnelLauncher {
    /// Run the session to completion with inherited stdio.
    async fn launch(&self, spec: &LaunchSpec) -> Result<ExitStatus>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program with a timeout, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading the settings file.
pub trait ConfigStore {
    /// Load the configuration, returning defaults if no file exists.
    fn load(&self) -> Result<SsmSshConfig>;
    /// Path of the settings file.
    fn path(&self) -> Result<PathBuf>;
}
