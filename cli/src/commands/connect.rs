//! `ssm-ssh <INSTANCE_ID>`: provision a one-time key and open the session.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::application::ports::{ConfigStore, ProgressReporter};
use crate::application::services::handoff::{check_prerequisites, launch_session};
use crate::application::services::session::{
    PreparedSession, SessionPorts, SessionRequest, prepare_session,
};
use crate::domain::SsmSshConfig;
use crate::domain::scripts::RemoteLayout;
use crate::infra::aws::AwsConnector;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::directory::HttpDirectory;
use crate::infra::fs::LocalFs;
use crate::infra::keygen::RsaKeyGenerator;
use crate::infra::launcher::SshLauncher;
use crate::output::OutputContext;
use crate::output::human::{HumanRenderer, command_line};
use crate::output::json::format_session;
use crate::output::reporter::{SilentReporter, TerminalReporter};

/// Arguments for the connect command.
#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Instance to connect to, as known to the instance directory
    pub instance_id: String,

    /// Login user whose authorized keys receive the session key
    #[arg(long, short = 'u')]
    pub user: Option<String>,

    /// SSH port forwarded through the tunnel
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Credential profile (with --region, skips the directory lookup)
    #[arg(long)]
    pub profile: Option<String>,

    /// Region (with --profile, skips the directory lookup)
    #[arg(long)]
    pub region: Option<String>,

    /// Seconds before the session key is removed from the instance
    #[arg(long, value_name = "SECS")]
    pub grace_period: Option<u64>,

    /// Delay between status polls of a remote command
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Maximum number of status polls before giving up
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Directory for session keys and pinned host keys
    #[arg(long, value_name = "DIR")]
    pub key_dir: Option<PathBuf>,

    /// Print the ssh command line instead of running it
    #[arg(long)]
    pub raw: bool,
}

impl ConnectArgs {
    /// Overlay command-line values on the loaded settings.
    pub fn apply(&self, config: &mut SsmSshConfig) {
        if let Some(user) = &self.user {
            config.session.user.clone_from(user);
        }
        if let Some(port) = self.port {
            config.session.port = port;
        }
        if let Some(secs) = self.grace_period {
            config.session.grace_period_secs = secs;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.polling.interval_ms = ms;
        }
        if let Some(n) = self.max_attempts {
            config.polling.max_attempts = n;
        }
        if let Some(dir) = &self.key_dir {
            config.keys.dir = Some(dir.display().to_string());
        }
    }
}

/// Run `ssm-ssh <INSTANCE_ID>`.
///
/// With `--raw` the session is provisioned and the `ssh` command line is
/// printed; with `--json` the prepared session is printed as JSON. Otherwise
/// `ssh` is started and this returns its exit code when it exits.
///
/// # Errors
///
/// Returns an error if the settings are invalid, a prerequisite is missing,
/// provisioning fails, or the ssh client itself fails.
pub async fn run(
    ctx: &OutputContext,
    args: ConnectArgs,
    json: bool,
    store: &impl ConfigStore,
) -> Result<ExitCode> {
    let mut config = store.load()?;
    args.apply(&mut config);
    config.validate()?;

    let runner = TokioCommandRunner;
    let launching = !(args.raw || json);
    if launching {
        check_prerequisites(&runner).await?;
    }

    let session = if json {
        prepare(&args, &config, &SilentReporter).await?
    } else {
        prepare(&args, &config, &TerminalReporter::new(ctx)).await?
    };

    if json {
        println!("{}", format_session(&session)?);
        return Ok(ExitCode::SUCCESS);
    }

    HumanRenderer::new(ctx).render_session(&session);
    if args.raw {
        println!("{}", command_line(&session.launch));
        return Ok(ExitCode::SUCCESS);
    }

    ctx.step(&format!("connecting to {}...", session.launch.instance_id));
    let code = launch_session(&SshLauncher::new(runner), &session.launch).await?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let code = code as u8;
    Ok(ExitCode::from(code))
}

async fn prepare(
    args: &ConnectArgs,
    config: &SsmSshConfig,
    reporter: &impl ProgressReporter,
) -> Result<PreparedSession> {
    let directory = HttpDirectory::new(&config.directory.url, config.directory_timeout())?;
    let keys = RsaKeyGenerator::new(config.keys.bits);
    let root = match &config.keys.dir {
        Some(dir) => PathBuf::from(dir),
        None => LocalFs::default_root()?,
    };
    let artifacts = LocalFs::new(root);

    let ports = SessionPorts {
        directory: &directory,
        cloud: &AwsConnector,
        keys: &keys,
        artifacts: &artifacts,
        reporter,
    };
    let request = SessionRequest {
        instance_id: &args.instance_id,
        region: args.region.as_deref(),
        profile: args.profile.as_deref(),
        config,
        layout: RemoteLayout::default(),
    };
    prepare_session(&ports, request).await
}
