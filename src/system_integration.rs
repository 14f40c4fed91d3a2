//! Desktop actions for history entries.
//!
//! The display layer hands a selected entry's path to this collaborator;
//! the history core itself never initiates these.

use anyhow::Result;
use std::path::Path;
use std::process::Command;

use crate::error::HistoryError;
use crate::path_validation::{validate_path, verify_path_exists};

/// Seam between the history service and the OS. Tests substitute a
/// recording fake; the display layer uses [`Desktop`].
pub trait DesktopIntegration: Send + Sync {
    /// Opens the file with its default application.
    fn open_path(&self, path: &Path) -> Result<()>;

    /// Reveals the file in the platform file manager.
    fn open_enclosing_folder(&self, path: &Path) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct Desktop;

impl Desktop {
    pub fn new() -> Self {
        Self
    }

    fn check(path: &Path) -> Result<()> {
        let refuse = |reason: String| HistoryError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        let path_str = path
            .to_str()
            .ok_or_else(|| refuse("path contains non-UTF-8 characters".to_string()))?;

        validate_path(path_str).map_err(refuse)?;
        verify_path_exists(path).map_err(refuse)?;
        Ok(())
    }

    fn run(mut command: Command) -> Result<()> {
        let output = command
            .output()
            .map_err(|e| anyhow::anyhow!("launcher execution failed: {}", e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("launcher exited with {}: {}", output.status, stderr.trim());
        }
        Ok(())
    }
}

impl DesktopIntegration for Desktop {
    fn open_path(&self, path: &Path) -> Result<()> {
        Self::check(path)?;
        tracing::debug!(path = %path.display(), "opening file");

        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            Self::run(cmd)
        }
        #[cfg(target_os = "windows")]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg("start").arg("").arg(path);
            Self::run(cmd)
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            Self::run(cmd)
        }
    }

    fn open_enclosing_folder(&self, path: &Path) -> Result<()> {
        Self::check(path)?;
        tracing::debug!(path = %path.display(), "revealing in file manager");

        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg("-R").arg(path);
            Self::run(cmd)
        }
        #[cfg(target_os = "windows")]
        {
            let mut arg = std::ffi::OsString::from("/select,");
            arg.push(path);
            let mut cmd = Command::new("explorer");
            cmd.arg(arg);
            Self::run(cmd)
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            // No portable "reveal" across Linux file managers; open the
            // parent directory instead.
            let parent = path
                .parent()
                .ok_or_else(|| anyhow::anyhow!("Path has no enclosing folder: {path:?}"))?;
            let mut cmd = Command::new("xdg-open");
            cmd.arg(parent);
            Self::run(cmd)
        }
    }
}
