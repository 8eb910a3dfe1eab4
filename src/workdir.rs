//! Scoped working-directory switch.
//!
//! The orchestrator runs every phase from the configured module directory.
//! The switch is process-wide, so it is held as a guard that restores the
//! caller's original directory on every exit path, including fatal aborts
//! after the switch succeeded.
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Guard holding the caller's original directory; dropping it restores that
/// directory.
#[derive(Debug)]
pub struct WorkdirScope {
    original: PathBuf,
    target: PathBuf,
}

impl WorkdirScope {
    /// Capture the current directory and switch to `target`. A failed switch
    /// is fatal and happens before anything else runs.
    pub fn enter(target: &Path) -> Result<Self> {
        let original = env::current_dir().context("capture current directory")?;
        env::set_current_dir(target)
            .with_context(|| format!("switch to working directory {}", target.display()))?;
        let target = env::current_dir().context("resolve working directory")?;
        tracing::debug!(dir = %target.display(), "entered working directory");
        Ok(Self { original, target })
    }

    /// The canonicalized directory all phases run in.
    pub fn dir(&self) -> &Path {
        &self.target
    }
}

impl Drop for WorkdirScope {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.original) {
            tracing::warn!(
                dir = %self.original.display(),
                %err,
                "failed to restore original working directory"
            );
        }
    }
}
