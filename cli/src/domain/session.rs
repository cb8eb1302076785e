//! Provisioning session: state machine, results, and the launch spec handed
//! to the interactive tunnel.
//!
//! Pure functions only, no I/O, no async.

use std::borrow::Cow;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shell_escape::unix::escape;

use crate::domain::error::{ProvisionError, ProvisionWarning};

/// Session document that opens a port-forwarding SSH tunnel.
pub const START_SSH_SESSION_DOCUMENT: &str = "AWS-StartSSHSession";

// ── State machine ─────────────────────────────────────────────────────────────

/// Provisioning progress for one session.
///
/// `Idle → KeyInstalling → KeyInstalled → HostKeysHarvested → ExpiryScheduled → Done`,
/// with `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    Idle,
    KeyInstalling,
    KeyInstalled,
    HostKeysHarvested,
    ExpiryScheduled,
    Done,
    Failed,
}

impl ProvisioningState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn successor(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::KeyInstalling),
            Self::KeyInstalling => Some(Self::KeyInstalled),
            Self::KeyInstalled => Some(Self::HostKeysHarvested),
            Self::HostKeysHarvested => Some(Self::ExpiryScheduled),
            Self::ExpiryScheduled => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Moves to `next` if it is the direct successor, or `Failed` from a
    /// non-terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::IllegalTransition`] for any other move.
    pub fn advance(self, next: Self) -> Result<Self, ProvisionError> {
        let legal = if next == Self::Failed {
            !self.is_terminal()
        } else {
            self.successor() == Some(next)
        };
        if legal {
            Ok(next)
        } else {
            Err(ProvisionError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// A remote command dispatched without awaiting completion.
///
/// Kept for audit: the command id is the correlation handle for the remote
/// service's own execution history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetachedCommand {
    pub command_id: String,
    pub instance_id: String,
    pub dispatched_at: DateTime<Utc>,
    /// Earliest time the remote action takes effect.
    pub not_before: DateTime<Utc>,
}

impl DetachedCommand {
    #[must_use]
    pub fn new(
        command_id: impl Into<String>,
        instance_id: impl Into<String>,
        dispatched_at: DateTime<Utc>,
        delay: Duration,
    ) -> Self {
        let not_before = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| dispatched_at.checked_add_signed(d))
            .unwrap_or(dispatched_at);
        Self {
            command_id: command_id.into(),
            instance_id: instance_id.into(),
            dispatched_at,
            not_before,
        }
    }
}

/// Output of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningResult {
    pub install_command_id: String,
    /// `<instanceId> <hostKeyLine>` entries, in harvest order.
    pub known_hosts_entries: Vec<String>,
    /// The scheduled expiry, or `None` if its submission failed.
    pub expiry: Option<DetachedCommand>,
    pub warnings: Vec<ProvisionWarning>,
}

/// Turns the install command's stdout into known-hosts entries.
///
/// Each non-blank line becomes `<instance_id> <line>`, order preserved. The
/// remote script is responsible for emitting only host keys.
#[must_use]
pub fn known_hosts_entries(instance_id: &str, harvest: &str) -> Vec<String> {
    harvest
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("{instance_id} {line}"))
        .collect()
}

// ── Hand-off ──────────────────────────────────────────────────────────────────

/// Everything needed to start the interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    pub instance_id: String,
    pub region: String,
    pub credential_profile: String,
    pub user: String,
    pub port: u16,
    pub identity_file: PathBuf,
    /// `None` when no host keys were harvested; checking is then disabled.
    pub known_hosts_file: Option<PathBuf>,
}

impl LaunchSpec {
    /// The `ProxyCommand` that opens the tunnel through the session service.
    ///
    /// `ssh` runs it through the user's shell after expanding `%` tokens, so
    /// region and profile are shell-quoted and their `%` doubled.
    #[must_use]
    pub fn proxy_command(&self) -> String {
        format!(
            "aws ssm start-session --target %h --document-name {START_SSH_SESSION_DOCUMENT} \
             --parameters portNumber=%p --region {} --profile {}",
            proxy_arg(&self.region),
            proxy_arg(&self.credential_profile)
        )
    }

    /// Arguments for `ssh`, excluding the program name.
    #[must_use]
    pub fn ssh_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            format!("ProxyCommand={}", self.proxy_command()),
            "-o".to_string(),
            "IdentitiesOnly=yes".to_string(),
            "-i".to_string(),
            self.identity_file.display().to_string(),
            "-p".to_string(),
            self.port.to_string(),
        ];
        match &self.known_hosts_file {
            Some(path) => args.extend([
                "-o".to_string(),
                format!("UserKnownHostsFile={}", path.display()),
                "-o".to_string(),
                "StrictHostKeyChecking=yes".to_string(),
                "-o".to_string(),
                format!("HostKeyAlias={}", self.instance_id),
            ]),
            None => args.extend([
                "-o".to_string(),
                "UserKnownHostsFile=/dev/null".to_string(),
                "-o".to_string(),
                "StrictHostKeyChecking=no".to_string(),
            ]),
        }
        args.push(format!("{}@{}", self.user, self.instance_id));
        args
    }
}

fn proxy_arg(value: &str) -> String {
    escape(Cow::Borrowed(value)).replace('%', "%%")
}
