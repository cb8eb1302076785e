//! Instance identity and directory record types.
//!
//! Pure functions only, no I/O, no async.

use serde::{Deserialize, Serialize};

use crate::domain::error::DirectoryError;

/// A resolved instance: where it lives and which credentials reach it.
///
/// Constructed only through [`InstanceRef::new`], which rejects empty
/// `region` or `credential_profile` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceRef {
    id: String,
    region: String,
    credential_profile: String,
}

impl InstanceRef {
    /// Builds an `InstanceRef`, enforcing non-empty region and profile.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::IncompleteRecord`] when `region` or
    /// `credential_profile` is empty or whitespace.
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        credential_profile: impl Into<String>,
    ) -> Result<Self, DirectoryError> {
        let id = id.into();
        let region = region.into();
        let credential_profile = credential_profile.into();
        if region.trim().is_empty() {
            return Err(DirectoryError::IncompleteRecord { id, field: "region" });
        }
        if credential_profile.trim().is_empty() {
            return Err(DirectoryError::IncompleteRecord {
                id,
                field: "account name",
            });
        }
        Ok(Self {
            id,
            region,
            credential_profile,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn credential_profile(&self) -> &str {
        &self.credential_profile
    }
}

/// Validates a logical instance identifier before it is sent anywhere.
///
/// Identifiers are non-empty and limited to `[A-Za-z0-9._-]` so they can be
/// used as a query parameter, an `ssh` host alias and a file name.
///
/// # Errors
///
/// Returns [`DirectoryError::InvalidInstanceId`] otherwise.
pub fn validate_instance_id(id: &str) -> Result<(), DirectoryError> {
    let valid = !id.is_empty()
        && id.len() <= 255
        && !id.starts_with(['-', '.'])
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(DirectoryError::InvalidInstanceId(id.to_string()))
    }
}

// ── Directory wire format ─────────────────────────────────────────────────────

/// Top-level directory lookup response: `{ "data": { "instances": [...] } }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryResponse {
    #[serde(default)]
    pub data: DirectoryData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryData {
    #[serde(default)]
    pub instances: Vec<DirectoryInstance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryInstance {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub meta: InstanceMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceMeta {
    #[serde(default)]
    pub origin: InstanceOrigin,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceOrigin {
    #[serde(default, rename = "accountName")]
    pub account_name: String,
}

impl DirectoryResponse {
    /// Picks the first matching record and turns it into an [`InstanceRef`].
    ///
    /// The directory keeps instance names unique by convention, so any
    /// further matches are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::InstanceNotFound`] for an empty match set and
    /// [`DirectoryError::IncompleteRecord`] when the match lacks a region or
    /// account name.
    pub fn into_instance_ref(self, instance_id: &str) -> Result<InstanceRef, DirectoryError> {
        let first = self
            .data
            .instances
            .into_iter()
            .next()
            .ok_or_else(|| DirectoryError::InstanceNotFound(instance_id.to_string()))?;
        InstanceRef::new(instance_id, first.region, first.meta.origin.account_name)
    }
}
