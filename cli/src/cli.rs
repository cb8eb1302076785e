//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser};

use crate::commands;
use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;

/// Ephemeral SSH access to instances through AWS Systems Manager
#[derive(Parser, Debug)]
#[command(name = "ssm-ssh", version, arg_required_else_help = true)]
pub struct Cli {
    /// Output in JSON format (prints the prepared session instead of connecting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub connect: commands::connect::ConnectArgs,
}

impl Cli {
    /// Default `tracing` filter directive for the chosen verbosity.
    #[must_use]
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "warn,ssm_ssh=debug",
            _ => "info,ssm_ssh=trace",
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be prepared or launched. A
    /// session that ends normally yields the remote exit code.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            connect,
            ..
        } = self;
        let ctx = OutputContext::new(no_color, quiet);
        commands::connect::run(&ctx, connect, json, &YamlConfigStore::default()).await
    }
}
