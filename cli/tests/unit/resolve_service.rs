//! Tests for the `resolve` application service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ssm_ssh::application::services::resolve::resolve_instance;
use ssm_ssh::domain::DirectoryError;

use crate::mocks::FakeDirectory;

fn directory_error(err: &anyhow::Error) -> &DirectoryError {
    err.downcast_ref::<DirectoryError>()
        .expect("expected a DirectoryError")
}

#[tokio::test]
async fn test_resolve_maps_first_record_to_region_and_profile() {
    let dir = FakeDirectory::found("eu-west-1", "investigations");

    let r = resolve_instance(&dir, "i-1234", None, None)
        .await
        .expect("resolves");

    assert_eq!(r.id(), "i-1234");
    assert_eq!(r.region(), "eu-west-1");
    assert_eq!(r.credential_profile(), "investigations");
    assert_eq!(dir.lookups.lock().unwrap().as_slice(), ["i-1234"]);
}

#[tokio::test]
async fn test_resolve_empty_match_set_is_instance_not_found() {
    let dir = FakeDirectory::empty();

    let err = resolve_instance(&dir, "i-missing", None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        directory_error(&err),
        DirectoryError::InstanceNotFound(id) if id == "i-missing"
    ));
}

#[tokio::test]
async fn test_resolve_transport_failure_is_directory_unavailable() {
    let err = resolve_instance(&FakeDirectory::unavailable(), "i-1234", None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        directory_error(&err),
        DirectoryError::DirectoryUnavailable(_)
    ));
}

#[tokio::test]
async fn test_resolve_rejects_invalid_id_before_lookup() {
    let dir = FakeDirectory::found("eu-west-1", "investigations");

    let err = resolve_instance(&dir, "i-1234&instanceName=x", None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        directory_error(&err),
        DirectoryError::InvalidInstanceId(_)
    ));
    assert_eq!(dir.lookup_count(), 0);
}

#[tokio::test]
async fn test_resolve_with_region_and_profile_skips_lookup() {
    let dir = FakeDirectory::unavailable();

    let r = resolve_instance(&dir, "i-1234", Some("us-east-1"), Some("deploy"))
        .await
        .expect("resolves without directory");

    assert_eq!(r.region(), "us-east-1");
    assert_eq!(r.credential_profile(), "deploy");
    assert_eq!(dir.lookup_count(), 0);
}

#[tokio::test]
async fn test_resolve_single_override_replaces_directory_value() {
    let dir = FakeDirectory::found("eu-west-1", "investigations");

    let r = resolve_instance(&dir, "i-1234", None, Some("breakglass"))
        .await
        .expect("resolves");

    assert_eq!(r.region(), "eu-west-1");
    assert_eq!(r.credential_profile(), "breakglass");
    assert_eq!(dir.lookup_count(), 1);
}

#[tokio::test]
async fn test_resolve_record_without_account_is_incomplete() {
    let dir = FakeDirectory::found("eu-west-1", "");

    let err = resolve_instance(&dir, "i-1234", None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        directory_error(&err),
        DirectoryError::IncompleteRecord { .. }
    ));
}
