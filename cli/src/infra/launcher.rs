//! `TunnelLauncher` implementation that runs the system `ssh` client.

use std::process::ExitStatus;

use anyhow::Result;

use crate::application::ports::{CommandRunner, TunnelLauncher};
use crate::domain::LaunchSpec;

/// Launches `ssh` with the tunnel configured as its `ProxyCommand`.
pub struct SshLauncher<R> {
    runner: R,
}

impl<R: CommandRunner> SshLauncher<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> TunnelLauncher for SshLauncher<R> {
    async fn launch(&self, spec: &LaunchSpec) -> Result<ExitStatus> {
        let args = spec.ssh_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::info!(
            instance_id = %spec.instance_id,
            user = %spec.user,
            pinned = spec.known_hosts_file.is_some(),
            "starting ssh"
        );
        self.runner.run_status("ssh", &args).await
    }
}
