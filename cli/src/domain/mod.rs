//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod command;
pub mod config;
pub mod error;
pub mod instance;
pub mod keys;
pub mod scripts;
pub mod session;

pub use command::{CommandStatus, Invocation, PollPolicy, RemoteCommand};
pub use config::SsmSshConfig;
pub use error::{ConfigError, DirectoryError, ProvisionError, ProvisionWarning, RemoteCommandError};
pub use instance::{DirectoryResponse, InstanceRef, validate_instance_id};
pub use keys::KeyPair;
pub use session::{
    DetachedCommand, LaunchSpec, ProvisioningResult, ProvisioningState, known_hosts_entries,
};
