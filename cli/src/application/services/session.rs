//! Application service: the ephemeral session use-case.
//!
//! Resolve, generate a key, provision it, and prepare the hand-off. Launching
//! is left to the caller so the prepared session can also be printed.
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::application::ports::{
    CloudConnector, InstanceDirectory, KeyGenerator, LocalArtifactWriter, PrincipalSource,
    ProgressReporter,
};
use crate::application::services::provision::{ProvisionOptions, Provisioner};
use crate::application::services::{handoff, resolve};
use crate::domain::command::audit_comment;
use crate::domain::keys::key_marker;
use crate::domain::scripts::{Banner, RemoteLayout};
use crate::domain::{InstanceRef, LaunchSpec, ProvisioningResult, SsmSshConfig};

/// Ports the session use-case needs.
pub struct SessionPorts<'a, D, C, K, W, R> {
    pub directory: &'a D,
    pub cloud: &'a C,
    pub keys: &'a K,
    pub artifacts: &'a W,
    pub reporter: &'a R,
}

/// What the operator asked for.
pub struct SessionRequest<'a> {
    pub instance_id: &'a str,
    /// Explicit region; with `profile` it bypasses the directory.
    pub region: Option<&'a str>,
    pub profile: Option<&'a str>,
    pub config: &'a SsmSshConfig,
    pub layout: RemoteLayout,
}

/// A provisioned session, ready to launch.
#[derive(Debug, Serialize)]
pub struct PreparedSession {
    pub instance: InstanceRef,
    pub principal: String,
    pub fingerprint: String,
    pub provisioning: ProvisioningResult,
    pub launch: LaunchSpec,
}

/// Run everything up to (not including) the interactive session.
///
/// Nothing is submitted remotely unless resolution succeeded, and nothing is
/// written locally unless provisioning succeeded.
///
/// # Errors
///
/// Returns the first fatal error: resolution, credentials, key generation,
/// install, or writing local artifacts.
pub async fn prepare_session<D, C, K, W, R>(
    ports: &SessionPorts<'_, D, C, K, W, R>,
    request: SessionRequest<'_>,
) -> Result<PreparedSession>
where
    D: InstanceDirectory,
    C: CloudConnector,
    K: KeyGenerator,
    W: LocalArtifactWriter,
    R: ProgressReporter,
{
    let SessionRequest {
        instance_id,
        region,
        profile,
        config,
        layout,
    } = request;
    let reporter = ports.reporter;

    reporter.step(&format!("resolving {instance_id}..."));
    let instance = resolve::resolve_instance(ports.directory, instance_id, region, profile).await?;
    reporter.success(&format!(
        "{} is in {} ({})",
        instance.id(),
        instance.region(),
        instance.credential_profile()
    ));

    let cloud = ports
        .cloud
        .connect(&instance)
        .await
        .with_context(|| format!("opening session for profile {}", instance.credential_profile()))?;
    let principal = cloud
        .principal()
        .await
        .context("identifying the calling principal")?;
    tracing::debug!(principal, "caller identity");

    reporter.step("generating session key...");
    let marker = key_marker(&uuid::Uuid::new_v4().simple().to_string());
    let key = ports.keys.generate(&marker).await?;
    tracing::debug!(fingerprint = %key.fingerprint, marker = %key.marker, "session key");

    let comment = audit_comment(&principal);
    let banner = config.session.tamper_banner.then(|| Banner {
        principal: principal.clone(),
        accessed_at: Utc::now(),
    });
    let opts = ProvisionOptions {
        user: &config.session.user,
        grace_period: config.grace_period(),
        poll: config.poll_policy(),
        banner,
        layout: &layout,
        comment: &comment,
    };
    let mut provisioner = Provisioner::new(&cloud, reporter);
    let provisioning = provisioner.provision(&instance, &key, &opts).await?;

    let launch = handoff::prepare_launch(
        ports.artifacts,
        &instance,
        &key,
        &provisioning,
        &config.session.user,
        config.session.port,
    )?;

    Ok(PreparedSession {
        instance,
        principal,
        fingerprint: key.fingerprint,
        provisioning,
        launch,
    })
}
