//! Domain types and validators for ssm-ssh configuration.
//!
//! Pure functions only, no I/O, no async, no filesystem access.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::command::PollPolicy;
use crate::domain::error::ConfigError;
use crate::domain::keys::validate_user;

/// Default instance directory endpoint.
pub const DEFAULT_DIRECTORY_URL: &str = "https://prism.gutools.co.uk";

/// Smallest RSA modulus accepted for session keys.
pub const MIN_KEY_BITS: usize = 2048;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.ssm-ssh/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SsmSshConfig {
    pub directory: DirectoryConfig,
    pub session: SessionConfig,
    pub polling: PollingConfig,
    pub keys: KeysConfig,
}

/// Instance directory lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DirectoryConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DIRECTORY_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Settings for the remote side of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Login user whose `authorized_keys` receives the session key.
    pub user: String,
    /// SSH port forwarded through the tunnel.
    pub port: u16,
    /// Delay before the installed key is removed again.
    ///
    /// Must exceed the time it takes to establish the interactive session;
    /// it is a heuristic, not a measured bound.
    pub grace_period_secs: u64,
    /// Install the "this instance has been accessed" login banner.
    pub tamper_banner: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user: "ubuntu".to_string(),
            port: 22,
            grace_period_secs: 30,
            tamper_banner: true,
        }
    }
}

/// Remote command polling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            max_attempts: 60,
        }
    }
}

/// Session key settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeysConfig {
    pub bits: usize,
    /// Where session artifacts are written; `~/.ssm-ssh/sessions` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            bits: 4096,
            dir: None,
        }
    }
}

// ── Derived values ───────────────────────────────────────────────────────────

impl SsmSshConfig {
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(self.polling.interval_ms),
            self.polling.max_attempts,
        )
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.session.grace_period_secs)
    }

    #[must_use]
    pub fn directory_timeout(&self) -> Duration {
        Duration::from_secs(self.directory.timeout_secs)
    }

    /// Validates every setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        fn invalid(key: &str, value: impl ToString, expected: &str) -> anyhow::Error {
            ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                expected: expected.to_string(),
            }
            .into()
        }

        if !(self.directory.url.starts_with("https://") || self.directory.url.starts_with("http://")) {
            return Err(invalid("directory.url", &self.directory.url, "an http(s) URL"));
        }
        if self.directory.timeout_secs == 0 {
            return Err(invalid("directory.timeout_secs", 0, "at least 1"));
        }
        if validate_user(&self.session.user).is_err() {
            return Err(invalid(
                "session.user",
                &self.session.user,
                "a POSIX login name ([a-z_][a-z0-9_-]*, at most 32 characters)",
            ));
        }
        if self.session.port == 0 {
            return Err(invalid("session.port", 0, "1-65535"));
        }
        if self.session.grace_period_secs == 0 {
            return Err(invalid("session.grace_period_secs", 0, "at least 1"));
        }
        if self.polling.interval_ms == 0 {
            return Err(invalid("polling.interval_ms", 0, "at least 1"));
        }
        if self.polling.max_attempts == 0 {
            return Err(invalid("polling.max_attempts", 0, "at least 1"));
        }
        if self.keys.bits < MIN_KEY_BITS {
            return Err(invalid("keys.bits", self.keys.bits, "at least 2048"));
        }
        Ok(())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
