//! Human-readable terminal renderer.

use std::borrow::Cow;

use shell_escape::unix::escape;

use crate::application::services::session::PreparedSession;
use crate::domain::LaunchSpec;
use crate::output::OutputContext;

/// The full `ssh` invocation for `spec`, quoted for a POSIX shell.
#[must_use]
pub fn command_line(spec: &LaunchSpec) -> String {
    std::iter::once(Cow::Borrowed("ssh"))
        .chain(spec.ssh_args().into_iter().map(|a| escape(Cow::Owned(a))))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders session results as human-readable terminal output.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Summarise what was provisioned before the session starts.
    pub fn render_session(&self, session: &PreparedSession) {
        let launch = &session.launch;
        self.ctx.header("Session");
        self.ctx.kv("Instance:", &launch.instance_id);
        self.ctx.kv(
            "Account:",
            &format!("{} ({})", launch.credential_profile, launch.region),
        );
        self.ctx.kv("Principal:", &session.principal);
        self.ctx.kv("Key:", &session.fingerprint);
        self.ctx
            .kv("Identity:", &launch.identity_file.display().to_string());
        match &launch.known_hosts_file {
            Some(path) => self.ctx.kv(
                "Host keys:",
                &format!(
                    "{} pinned in {}",
                    session.provisioning.known_hosts_entries.len(),
                    path.display()
                ),
            ),
            None => self.ctx.kv("Host keys:", "not pinned"),
        }
        match &session.provisioning.expiry {
            Some(expiry) => self.ctx.kv(
                "Key expiry:",
                &format!(
                    "{} (command {})",
                    expiry.not_before.format("%Y-%m-%d %H:%M:%S UTC"),
                    expiry.command_id
                ),
            ),
            None => self.ctx.kv("Key expiry:", "not scheduled"),
        }
    }
}
