//! Unit tests for ssm-ssh
//!
//! These tests use faked ports and run fast without network access.

mod channel_service;
mod helpers;
mod mocks;
mod resolve_service;
