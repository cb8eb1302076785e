//! Application service: hand-off to the interactive session.
//!
//! Writes the local artifacts the SSH client needs and launches it. Imports
//! only from `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, LocalArtifactWriter, TunnelLauncher};
use crate::domain::{InstanceRef, KeyPair, LaunchSpec, ProvisioningResult};

/// File name of the private key inside the session directory.
pub const IDENTITY_FILE_NAME: &str = "id_rsa";
/// File name of the pinned host keys inside the session directory.
pub const KNOWN_HOSTS_FILE_NAME: &str = "known_hosts";
/// Exit code `ssh` reserves for its own errors.
pub const SSH_FAILURE_CODE: i32 = 255;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Programs the launched session depends on, with install hints.
const PREREQUISITES: &[(&str, &[&str], &str)] = &[
    ("ssh", &["-V"], "Install an OpenSSH client."),
    (
        "aws",
        &["--version"],
        "Install the AWS CLI: https://aws.amazon.com/cli/",
    ),
    (
        "session-manager-plugin",
        &["--version"],
        "Install the Session Manager plugin: \
         https://docs.aws.amazon.com/systems-manager/latest/userguide/session-manager-working-with-install-plugin.html",
    ),
];

/// Write the private key and, if any were harvested, the known-hosts
/// entries, then build the [`LaunchSpec`].
///
/// Both files are owner-only. An empty harvest writes no known-hosts file and
/// the resulting launch disables host key checking.
///
/// # Errors
///
/// Returns an error if either artifact cannot be written.
pub fn prepare_launch(
    writer: &impl LocalArtifactWriter,
    instance: &InstanceRef,
    key: &KeyPair,
    result: &ProvisioningResult,
    user: &str,
    port: u16,
) -> Result<LaunchSpec> {
    let dir = writer.session_dir(instance.id(), &key.marker);

    let identity_file = dir.join(IDENTITY_FILE_NAME);
    writer
        .write_private(&identity_file, &key.private_key)
        .context("writing session private key")?;

    let known_hosts_file = if result.known_hosts_entries.is_empty() {
        None
    } else {
        let path = dir.join(KNOWN_HOSTS_FILE_NAME);
        let mut contents = result.known_hosts_entries.join("\n");
        contents.push('\n');
        writer
            .write_private(&path, &contents)
            .context("writing known hosts file")?;
        Some(path)
    };

    Ok(LaunchSpec {
        instance_id: instance.id().to_string(),
        region: instance.region().to_string(),
        credential_profile: instance.credential_profile().to_string(),
        user: user.to_string(),
        port,
        identity_file,
        known_hosts_file,
    })
}

/// Fail early if a program the session needs is missing.
///
/// # Errors
///
/// Returns an error naming the first program that cannot be run.
pub async fn check_prerequisites(runner: &impl CommandRunner) -> Result<()> {
    for (program, args, hint) in PREREQUISITES {
        let available = runner
            .run_with_timeout(program, args, PROBE_TIMEOUT)
            .await
            .is_ok_and(|out| out.status.success());
        tracing::debug!(program, available, "prerequisite probe");
        anyhow::ensure!(available, "'{program}' is not available on PATH.\n\n{hint}");
    }
    Ok(())
}

/// Start the interactive session and wait for it to end.
///
/// Returns the exit code of the session. `ssh` exits with the remote
/// command's code, which is passed through rather than treated as failure.
///
/// # Errors
///
/// Returns an error if the client cannot be started, exits with
/// [`SSH_FAILURE_CODE`], or is killed by a signal.
pub async fn launch_session(launcher: &impl TunnelLauncher, spec: &LaunchSpec) -> Result<i32> {
    let status = launcher.launch(spec).await?;
    match status.code() {
        Some(SSH_FAILURE_CODE) => anyhow::bail!(
            "ssh could not connect to {} (exit code {SSH_FAILURE_CODE})",
            spec.instance_id
        ),
        Some(code) => {
            tracing::debug!(code, "session ended");
            Ok(code)
        }
        None => anyhow::bail!("ssh was terminated by a signal"),
    }
}
