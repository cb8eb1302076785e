//! Ephemeral key material and public key validation.
//!
//! Pure functions only: key generation itself lives behind the
//! `KeyGenerator` port.

use std::fmt;

use anyhow::Result;

use crate::domain::error::ProvisionError;

/// Prefix of the per-key marker carried in the public key comment.
pub const KEY_MARKER_PREFIX: &str = "ssm-ssh-";

/// A one-time keypair for a single session.
///
/// `public_key` is a single `authorized_keys` line ending in `marker`;
/// `private_key` is PEM-encoded PKCS#8 and never leaves the local machine.
#[derive(Clone)]
pub struct KeyPair {
    pub public_key: String,
    pub private_key: String,
    pub marker: String,
    pub fingerprint: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("marker", &self.marker)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Builds a unique per-key marker from a random token.
#[must_use]
pub fn key_marker(token: &str) -> String {
    format!("{KEY_MARKER_PREFIX}{token}")
}

/// Returns `true` if `marker` only uses characters that are inert in both
/// shell single quotes and `grep -F` patterns.
#[must_use]
pub fn is_safe_marker(marker: &str) -> bool {
    marker.starts_with(KEY_MARKER_PREFIX)
        && marker.len() > KEY_MARKER_PREFIX.len()
        && marker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validates that a public key line is safe to embed in a shell script.
///
/// # Errors
///
/// Returns [`ProvisionError::UnsafePublicKey`] if the key type is not
/// `ssh-rsa`/`ssh-ed25519`, the line has the wrong shape, or it contains
/// characters outside base64 and the marker alphabet.
pub fn validate_public_key(key: &str) -> Result<()> {
    let key = key.trim();
    let mut parts = key.split(' ');
    let (Some(algorithm), Some(material), Some(comment), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ProvisionError::UnsafePublicKey(
            "expected '<algorithm> <base64> <marker>'".into(),
        )
        .into());
    };
    if !matches!(algorithm, "ssh-rsa" | "ssh-ed25519") {
        return Err(ProvisionError::UnsafePublicKey(format!("unsupported key type {algorithm:?}")).into());
    }
    if material.is_empty()
        || !material
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c))
    {
        return Err(ProvisionError::UnsafePublicKey("key material is not base64".into()).into());
    }
    if !is_safe_marker(comment) {
        return Err(ProvisionError::UnsafePublicKey(format!("unexpected key comment {comment:?}")).into());
    }
    Ok(())
}

/// Validates a POSIX login name before it is used in remote paths.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidUser`] if the name is not of the form
/// `[a-z_][a-z0-9_-]*` with at most 32 characters.
pub fn validate_user(user: &str) -> Result<()> {
    let mut chars = user.chars();
    let valid = user.len() <= 32
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ProvisionError::InvalidUser(user.to_string()).into())
    }
}
