//! Filesystem infrastructure: implements `LocalArtifactWriter`.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::LocalArtifactWriter;

/// Writes session artifacts under a root directory, laid out as
/// `<root>/<instance_id>/<marker>/`.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.ssm-ssh/sessions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_root() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".ssm-ssh").join("sessions"))
            .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))
    }
}

impl LocalArtifactWriter for LocalFs {
    fn session_dir(&self, instance_id: &str, marker: &str) -> PathBuf {
        self.root.join(instance_id).join(marker)
    }

    fn write_private(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
            set_permissions(parent, 0o700)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("open {}", path.display()))?;
        // A pre-existing file keeps its old mode through `open`.
        set_permissions(path, 0o600)?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote session artifact");
        Ok(())
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
