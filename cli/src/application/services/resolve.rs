//! Application service: instance resolution use-case.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::InstanceDirectory;
use crate::domain::{InstanceRef, validate_instance_id};

/// Resolve `instance_id` to its region and credential profile.
///
/// When both `region` and `profile` are supplied the directory is not
/// consulted.
///
/// # Errors
///
/// Returns [`crate::domain::DirectoryError::InvalidInstanceId`] before any
/// request is made, `InstanceNotFound` for an empty match set, and
/// `DirectoryUnavailable` when the lookup itself fails.
pub async fn resolve_instance(
    directory: &impl InstanceDirectory,
    instance_id: &str,
    region: Option<&str>,
    profile: Option<&str>,
) -> Result<InstanceRef> {
    validate_instance_id(instance_id)?;

    if let (Some(region), Some(profile)) = (region, profile) {
        tracing::debug!(instance_id, region, profile, "skipping directory lookup");
        return Ok(InstanceRef::new(instance_id, region, profile)?);
    }

    let response = directory.lookup(instance_id).await?;
    let mut instance = response.into_instance_ref(instance_id)?;

    // A single explicit value still overrides the directory record.
    if region.is_some() || profile.is_some() {
        instance = InstanceRef::new(
            instance_id,
            region.unwrap_or(instance.region()),
            profile.unwrap_or(instance.credential_profile()),
        )?;
    }

    tracing::debug!(
        instance_id,
        region = instance.region(),
        profile = instance.credential_profile(),
        "resolved instance"
    );
    Ok(instance)
}
