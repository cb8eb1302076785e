//! Tests for the remote command channel: submission and bounded polling.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use ssm_ssh::application::services::channel::RemoteCommandChannel;
use ssm_ssh::domain::{CommandStatus, PollPolicy, RemoteCommandError};

use crate::mocks::{ScriptedCommandService, failure, instance, pending, success};

fn policy(max_attempts: u32) -> PollPolicy {
    PollPolicy::new(Duration::from_millis(500), max_attempts)
}

fn remote_error(err: &anyhow::Error) -> &RemoteCommandError {
    err.downcast_ref::<RemoteCommandError>()
        .expect("expected a RemoteCommandError")
}

#[tokio::test]
async fn test_submit_returns_pending_command_with_service_id() {
    let svc = ScriptedCommandService::idle();
    let channel = RemoteCommandChannel::new(&svc);

    let cmd = channel
        .submit(&instance(), "echo hi", "ssm-ssh:alice")
        .await
        .expect("submitted");

    assert_eq!(cmd.command_id(), "cmd-1");
    assert_eq!(cmd.instance_id(), "i-1234");
    assert_eq!(cmd.status(), CommandStatus::Pending);
    let subs = svc.submissions();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].script, "echo hi");
    assert_eq!(subs[0].comment, "ssm-ssh:alice");
}

#[tokio::test]
async fn test_submit_rejection_is_submission_failed_and_not_retried() {
    let svc = ScriptedCommandService::idle().rejecting_submission(0);
    let channel = RemoteCommandChannel::new(&svc);

    let err = channel
        .submit(&instance(), "echo hi", "c")
        .await
        .unwrap_err();

    match remote_error(&err) {
        RemoteCommandError::RemoteSubmissionFailed(msg) => {
            assert!(msg.contains("AccessDenied"), "got: {msg}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(svc.submissions().is_empty());
    assert_eq!(svc.poll_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_success_on_third_poll_issues_exactly_three_polls() {
    let svc = ScriptedCommandService::new([pending(), pending(), success("out\n")]);
    let channel = RemoteCommandChannel::new(&svc);
    let mut cmd = channel.submit(&instance(), "s", "c").await.unwrap();
    let started = tokio::time::Instant::now();

    let out = channel
        .await_completion(&mut cmd, policy(60))
        .await
        .expect("completes");

    assert_eq!(out, "out\n");
    assert_eq!(svc.poll_count(), 3);
    assert_eq!(cmd.status(), CommandStatus::Success);
    // First poll is immediate; two intervals separate the three polls.
    assert_eq!(started.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_first_poll_success_does_not_sleep() {
    let svc = ScriptedCommandService::new([success("")]);
    let channel = RemoteCommandChannel::new(&svc);
    let mut cmd = channel.submit(&instance(), "s", "c").await.unwrap();
    let started = tokio::time::Instant::now();

    let out = channel.await_completion(&mut cmd, policy(60)).await.unwrap();

    assert_eq!(out, "");
    assert_eq!(svc.poll_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_poll_budget_exhausted_is_poll_timeout_after_max_attempts() {
    let svc = ScriptedCommandService::new(std::iter::repeat_with(pending).take(61));
    let channel = RemoteCommandChannel::new(&svc);
    let mut cmd = channel.submit(&instance(), "s", "c").await.unwrap();

    let err = channel
        .await_completion(&mut cmd, policy(60))
        .await
        .unwrap_err();

    match remote_error(&err) {
        RemoteCommandError::PollTimeout {
            command_id,
            attempts,
            waited,
        } => {
            assert_eq!(command_id, "cmd-1");
            assert_eq!(*attempts, 60);
            assert!(*waited <= policy(60).ceiling());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(svc.poll_count(), 60);
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy_polls_once() {
    let svc = ScriptedCommandService::new([pending(), success("late")]);
    let channel = RemoteCommandChannel::new(&svc);
    let mut cmd = channel.submit(&instance(), "s", "c").await.unwrap();

    let err = channel.await_completion(&mut cmd, policy(1)).await.unwrap_err();

    assert!(matches!(
        remote_error(&err),
        RemoteCommandError::PollTimeout { attempts: 1, .. }
    ));
    assert_eq!(svc.poll_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_remote_failure_is_execution_failed_with_output() {
    let svc = ScriptedCommandService::new([
        pending(),
        failure(CommandStatus::Failure, "chown: invalid user"),
    ]);
    let channel = RemoteCommandChannel::new(&svc);
    let mut cmd = channel.submit(&instance(), "s", "c").await.unwrap();

    let err = channel.await_completion(&mut cmd, policy(60)).await.unwrap_err();

    match remote_error(&err) {
        RemoteCommandError::RemoteExecutionFailed {
            status, output, ..
        } => {
            assert_eq!(*status, CommandStatus::Failure);
            assert_eq!(output, "chown: invalid user");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(svc.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_remote_timeout_is_execution_failed() {
    let svc = ScriptedCommandService::new([failure(CommandStatus::TimedOut, "")]);
    let channel = RemoteCommandChannel::new(&svc);
    let mut cmd = channel.submit(&instance(), "s", "c").await.unwrap();

    let err = channel.await_completion(&mut cmd, policy(60)).await.unwrap_err();

    assert!(matches!(
        remote_error(&err),
        RemoteCommandError::RemoteExecutionFailed {
            status: CommandStatus::TimedOut,
            ..
        }
    ));
}
