//! Application service: session key provisioning.
//!
//! Installs the session key, harvests host keys from the same command's
//! output, and schedules the key's removal. Imports only from
//! `crate::domain` and `crate::application::ports`.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use crate::application::ports::{CommandService, ProgressReporter};
use crate::application::services::channel::RemoteCommandChannel;
use crate::domain::scripts::{Banner, RemoteLayout, expiry_script, install_script};
use crate::domain::{
    DetachedCommand, InstanceRef, KeyPair, PollPolicy, ProvisionWarning, ProvisioningResult,
    ProvisioningState, known_hosts_entries,
};

/// Inputs to one provisioning run.
pub struct ProvisionOptions<'a> {
    pub user: &'a str,
    pub grace_period: Duration,
    pub poll: PollPolicy,
    /// Login banner to install; `None` skips tamper evidence.
    pub banner: Option<Banner>,
    pub layout: &'a RemoteLayout,
    /// Audit comment attached to every submitted command.
    pub comment: &'a str,
}

/// Drives [`ProvisioningState`] from `Idle` to `Done` (or `Failed`).
pub struct Provisioner<'a, S, R> {
    channel: RemoteCommandChannel<'a, S>,
    reporter: &'a R,
    state: ProvisioningState,
}

impl<'a, S: CommandService, R: ProgressReporter> Provisioner<'a, S, R> {
    pub fn new(service: &'a S, reporter: &'a R) -> Self {
        Self {
            channel: RemoteCommandChannel::new(service),
            reporter,
            state: ProvisioningState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> ProvisioningState {
        self.state
    }

    /// Provision `key` on `instance`.
    ///
    /// The expiry command is only submitted after the install command
    /// succeeded. A failed expiry submission does not fail the run; it is
    /// reported as [`ProvisionWarning::ExpiryNotConfirmed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the scripts cannot be built, the install command
    /// cannot be submitted, or it does not complete successfully. The state
    /// is `Failed` afterwards.
    pub async fn provision(
        &mut self,
        instance: &InstanceRef,
        key: &KeyPair,
        opts: &ProvisionOptions<'_>,
    ) -> Result<ProvisioningResult> {
        let result = self.run(instance, key, opts).await;
        if result.is_err() && !self.state.is_terminal() {
            self.state = ProvisioningState::Failed;
        }
        result
    }

    async fn run(
        &mut self,
        instance: &InstanceRef,
        key: &KeyPair,
        opts: &ProvisionOptions<'_>,
    ) -> Result<ProvisioningResult> {
        // Both scripts are built before anything is sent.
        let install = install_script(opts.user, &key.public_key, opts.banner.as_ref(), opts.layout)?;
        let expiry = expiry_script(opts.user, &key.marker, opts.grace_period, opts.layout)?;

        self.advance(ProvisioningState::KeyInstalling)?;
        self.reporter
            .step(&format!("installing session key for {} on {}...", opts.user, instance.id()));
        let mut command = self.channel.submit(instance, &install, opts.comment).await?;
        let harvest = self.channel.await_completion(&mut command, opts.poll).await?;
        self.advance(ProvisioningState::KeyInstalled)?;
        self.reporter.success("session key installed");

        let mut warnings = Vec::new();
        let entries = known_hosts_entries(instance.id(), &harvest);
        if entries.is_empty() {
            let warning = ProvisionWarning::NoHostKeys;
            tracing::warn!(instance_id = instance.id(), "no host keys in install output");
            self.reporter.warn(&warning.to_string());
            warnings.push(warning);
        } else {
            tracing::debug!(count = entries.len(), "harvested host keys");
        }
        self.advance(ProvisioningState::HostKeysHarvested)?;

        let expiry = match self.channel.submit(instance, &expiry, opts.comment).await {
            Ok(command) => {
                let detached = DetachedCommand::new(
                    command.command_id(),
                    instance.id(),
                    Utc::now(),
                    opts.grace_period,
                );
                tracing::info!(
                    command_id = %detached.command_id,
                    not_before = %detached.not_before,
                    "key expiry scheduled"
                );
                Some(detached)
            }
            Err(e) => {
                let warning = ProvisionWarning::ExpiryNotConfirmed {
                    reason: format!("{e:#}"),
                };
                tracing::warn!(error = %format!("{e:#}"), "key expiry submission failed");
                self.reporter.warn(&warning.to_string());
                warnings.push(warning);
                None
            }
        };
        self.advance(ProvisioningState::ExpiryScheduled)?;
        self.advance(ProvisioningState::Done)?;

        Ok(ProvisioningResult {
            install_command_id: command.command_id().to_string(),
            known_hosts_entries: entries,
            expiry,
            warnings,
        })
    }

    fn advance(&mut self, next: ProvisioningState) -> Result<()> {
        self.state = self.state.advance(next)?;
        Ok(())
    }
}
