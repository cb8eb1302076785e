//! Remote shell scripts submitted through the command service.
//!
//! Every value interpolated into a script is either validated against a
//! strict alphabet or quoted with `shell_escape::unix::escape`. The install
//! script prints nothing on stdout except host public keys.
//!
//! Both scripts edit the authorized-keys file while holding `flock` on it
//! when the utility is installed, so an expiry rewrite never races an install
//! append. Without `flock` the edits run unlocked and an append landing
//! between the expiry's read and rewrite is lost.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use shell_escape::unix::escape;

use crate::domain::error::ProvisionError;
use crate::domain::keys::{is_safe_marker, validate_public_key, validate_user};

/// File name of the login banner fragment inside the motd directory.
pub const BANNER_FRAGMENT: &str = "99-ssm-ssh-accessed";

/// Takes an exclusive lock on fd 9 when `flock` is available.
const LOCK_AUTH_KEYS: &str = "if command -v flock >/dev/null 2>&1; then flock 9 || true; fi";

/// Lists the SSH daemon's configured host keys and prints each `.pub` file.
pub const HOST_KEYS_SCRIPT: &str = r#"/usr/sbin/sshd -T 2>/dev/null | awk '$1 == "hostkey" { print $2 }' | while read -r hostkey; do
  if [ -r "$hostkey.pub" ]; then cat "$hostkey.pub"; fi
done"#;

/// Locations on the remote instance touched by the scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    /// Home directory of the login user; resolved with `getent` when `None`.
    pub home: Option<String>,
    /// Tamper-evidence directory; the banner is only installed if it exists.
    pub motd_dir: String,
    /// File regenerated from `motd_dir` after the banner is installed.
    pub dynamic_motd: String,
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self {
            home: None,
            motd_dir: "/etc/update-motd.d".to_string(),
            dynamic_motd: "/run/motd.dynamic".to_string(),
        }
    }
}

/// Who accessed the instance, and when. Rendered into the login banner.
#[derive(Debug, Clone)]
pub struct Banner {
    pub principal: String,
    pub accessed_at: DateTime<Utc>,
}

fn quote(s: &str) -> Cow<'_, str> {
    escape(Cow::Borrowed(s))
}

/// Replaces control characters so the value stays on one line.
fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { '?' } else { c })
        .collect()
}

fn user_home_lines(user: &str, layout: &RemoteLayout) -> String {
    let mut out = format!("USER_NAME={}\n", quote(user));
    match &layout.home {
        Some(home) => {
            let _ = writeln!(out, "USER_HOME={}", quote(home));
        }
        None => {
            out.push_str("USER_HOME=\"$(getent passwd \"$USER_NAME\" | cut -d: -f6)\"\n");
            out.push_str("[ -n \"$USER_HOME\" ] || USER_HOME=\"/home/$USER_NAME\"\n");
        }
    }
    out.push_str("AUTH_KEYS=\"$USER_HOME/.ssh/authorized_keys\"\n");
    out
}

/// Script fragment that installs the "this instance has been accessed"
/// banner once, then regenerates the dynamic message of the day.
///
/// Check-before-write: an existing fragment is never rewritten, so running
/// the script repeatedly leaves exactly one banner.
#[must_use]
pub fn banner_script(banner: &Banner, layout: &RemoteLayout) -> String {
    let dir = quote(&layout.motd_dir);
    let fragment = format!("{}/{BANNER_FRAGMENT}", layout.motd_dir);
    let fragment = quote(&fragment);
    let message = format!(
        "*** This instance has been accessed via ssm-ssh by {} at {} ***",
        single_line(&banner.principal),
        banner.accessed_at.format("%Y-%m-%dT%H:%M:%SZ"),
    );
    let message = quote(&message);
    let dynamic = quote(&layout.dynamic_motd);

    format!(
        "if [ -d {dir} ]; then
  if [ ! -f {fragment} ]; then
    cat > {fragment} <<'SSM_SSH_BANNER'
#!/bin/sh
printf '%s\\n' ''
printf '%s\\n' {message}
printf '%s\\n' ''
SSM_SSH_BANNER
    chmod 0755 {fragment}
  fi
  if command -v run-parts >/dev/null 2>&1; then
    run-parts {dir} > {dynamic} 2>/dev/null || true
  fi
fi
"
    )
}

/// Builds the install script: authorize `public_key` for `user`, optionally
/// install the access banner, then print the host public keys.
///
/// Appending is not idempotent: every run installs a new key line.
///
/// # Errors
///
/// Returns an error if `user` or `public_key` fail validation.
pub fn install_script(
    user: &str,
    public_key: &str,
    banner: Option<&Banner>,
    layout: &RemoteLayout,
) -> Result<String> {
    validate_user(user)?;
    validate_public_key(public_key)?;
    let key = quote(public_key.trim());

    let mut script = String::from("set -e\n");
    script.push_str(&user_home_lines(user, layout));
    let _ = write!(
        script,
        "mkdir -p \"$USER_HOME/.ssh\"
chmod 0700 \"$USER_HOME/.ssh\"
chown \"$USER_NAME\" \"$USER_HOME/.ssh\"
{{
  {LOCK_AUTH_KEYS}
  printf '%s\\n' {key} >> \"$AUTH_KEYS\"
}} 9>> \"$AUTH_KEYS\"
chown \"$USER_NAME\" \"$AUTH_KEYS\"
chmod 0600 \"$AUTH_KEYS\"
"
    );
    if let Some(banner) = banner {
        script.push_str("{\n");
        script.push_str(&banner_script(banner, layout));
        script.push_str("} >/dev/null 2>&1 || true\n");
    }
    script.push_str(HOST_KEYS_SCRIPT);
    script.push('\n');
    Ok(script)
}

/// Builds the expiry script: wait `grace`, then delete only the lines of the
/// authorized-keys file that carry `marker`.
///
/// The file is rewritten in place so its owner and mode are preserved, and it
/// is left untouched if `grep` fails for any reason other than "no lines
/// selected". The read and rewrite happen under the same lock as the install
/// append.
///
/// # Errors
///
/// Returns an error if `user` is invalid or `marker` is not a safe marker.
pub fn expiry_script(
    user: &str,
    marker: &str,
    grace: Duration,
    layout: &RemoteLayout,
) -> Result<String> {
    validate_user(user)?;
    if !is_safe_marker(marker) {
        return Err(ProvisionError::UnsafePublicKey(format!("unsafe key marker {marker:?}")).into());
    }

    let mut script = format!("sleep {}\n", grace.as_secs());
    script.push_str(&user_home_lines(user, layout));
    let _ = write!(
        script,
        "umask 077
if [ -f \"$AUTH_KEYS\" ]; then
  {{
    {LOCK_AUTH_KEYS}
    grep -vF -- '{marker}' \"$AUTH_KEYS\" > \"$AUTH_KEYS.ssm-ssh.tmp\"
    rc=$?
    if [ \"$rc\" -le 1 ]; then
      cat \"$AUTH_KEYS.ssm-ssh.tmp\" > \"$AUTH_KEYS\"
    fi
    rm -f \"$AUTH_KEYS.ssm-ssh.tmp\"
  }} 9>> \"$AUTH_KEYS\"
fi
"
    );
    Ok(script)
}
