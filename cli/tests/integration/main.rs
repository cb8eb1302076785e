//! Integration tests for the ssm-ssh CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them reach AWS: every run fails or stops before a cloud call.

mod cli_tests;
