//! AWS implementations of the cloud ports: Systems Manager for remote
//! commands, STS for the caller identity.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::Client as SsmClient;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::CommandInvocationStatus;
use aws_sdk_sts::Client as StsClient;

use crate::application::ports::{CloudConnector, CommandService, PrincipalSource};
use crate::domain::command::RUN_SHELL_SCRIPT_DOCUMENT;
use crate::domain::{CommandStatus, InstanceRef, Invocation};

/// Builds an [`AwsSession`] from a named shared-config profile and region.
#[derive(Debug, Default, Clone, Copy)]
pub struct AwsConnector;

impl CloudConnector for AwsConnector {
    type Session = AwsSession;

    async fn connect(&self, instance: &InstanceRef) -> Result<AwsSession> {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(instance.region().to_string()))
            .profile_name(instance.credential_profile())
            .load()
            .await;
        tracing::debug!(
            region = instance.region(),
            profile = instance.credential_profile(),
            "loaded AWS configuration"
        );
        Ok(AwsSession {
            ssm: SsmClient::new(&config),
            sts: StsClient::new(&config),
        })
    }
}

/// Service clients scoped to one account and region.
#[derive(Clone)]
pub struct AwsSession {
    ssm: SsmClient,
    sts: StsClient,
}

/// Collapses the service's invocation states onto the local status model.
fn map_status(status: Option<&CommandInvocationStatus>) -> CommandStatus {
    match status {
        Some(CommandInvocationStatus::Success) => CommandStatus::Success,
        Some(CommandInvocationStatus::Failed | CommandInvocationStatus::Cancelled) => {
            CommandStatus::Failure
        }
        Some(CommandInvocationStatus::TimedOut) => CommandStatus::TimedOut,
        _ => CommandStatus::Pending,
    }
}

impl CommandService for AwsSession {
    async fn send_command(
        &self,
        instance_id: &str,
        script: &str,
        comment: &str,
    ) -> Result<String> {
        let out = self
            .ssm
            .send_command()
            .document_name(RUN_SHELL_SCRIPT_DOCUMENT)
            .instance_ids(instance_id)
            .comment(comment)
            .parameters("commands", vec![script.to_string()])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(e)))?;

        out.command()
            .and_then(|c| c.command_id())
            .map(str::to_string)
            .context("SendCommand response carried no command id")
    }

    async fn get_invocation(&self, command_id: &str, instance_id: &str) -> Result<Invocation> {
        let result = self
            .ssm
            .get_command_invocation()
            .command_id(command_id)
            .instance_id(instance_id)
            .send()
            .await;

        match result {
            Ok(out) => {
                let status = map_status(out.status());
                let stdout = if status.is_terminal() {
                    out.standard_output_content().map(str::to_string)
                } else {
                    None
                };
                Ok(Invocation { status, stdout })
            }
            // The invocation is registered asynchronously after SendCommand.
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_invocation_does_not_exist()) =>
            {
                tracing::trace!(command_id, "invocation not registered yet");
                Ok(Invocation::pending())
            }
            Err(e) => Err(anyhow::anyhow!("{}", DisplayErrorContext(e))),
        }
    }
}

impl PrincipalSource for AwsSession {
    async fn principal(&self) -> Result<String> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(e)))?;
        identity
            .arn()
            .map(str::to_string)
            .context("GetCallerIdentity response carried no ARN")
    }
}
