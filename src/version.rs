//! Terraform version pinning via tfenv.
//!
//! The resolver runs once, before any phase. tfenv being absent is not an
//! error: the run proceeds with whatever terraform is already on the path.
//! A failed install/select of an explicitly requested version is fatal,
//! because the caller asked for exactly that version; a failed refresh of
//! `latest` only degrades to the already-active version.
use crate::cli::LATEST_VERSION;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Command;

/// Name of the version-manager helper probed on `PATH`.
pub const VERSION_MANAGER: &str = "tfenv";

/// Outcome of the pre-run version resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionResolution {
    /// tfenv was not found; the run uses the terraform already installed.
    Skipped,
    /// tfenv installed and selected the given version token.
    Selected(String),
}

/// Resolve the requested terraform version before any phase runs.
pub fn resolve(request: &str) -> Result<VersionResolution> {
    let helper = match which::which(VERSION_MANAGER) {
        Ok(path) => path,
        Err(_) => {
            tracing::warn!(
                "{VERSION_MANAGER} not found on PATH; skipping version pinning for {request:?}"
            );
            return Ok(VersionResolution::Skipped);
        }
    };
    resolve_with(&helper, request)
}

/// Resolution against a concrete helper binary. Split out so tests can point
/// at a stub tfenv.
fn resolve_with(helper: &Path, request: &str) -> Result<VersionResolution> {
    let explicit = request != LATEST_VERSION;
    for subcommand in ["install", "use"] {
        match run_helper(helper, subcommand, request) {
            Ok(()) => {}
            Err(err) if explicit => {
                return Err(err.context(format!(
                    "pin terraform version {request:?} (explicitly requested versions must resolve)"
                )));
            }
            Err(err) => {
                tracing::warn!(%err, "tfenv {subcommand} latest failed; continuing with the active version");
                return Ok(VersionResolution::Skipped);
            }
        }
    }
    tracing::info!(version = request, "terraform version selected via tfenv");
    Ok(VersionResolution::Selected(request.to_string()))
}

fn run_helper(helper: &Path, subcommand: &str, version: &str) -> Result<()> {
    let output = Command::new(helper)
        .args([subcommand, version])
        .output()
        .with_context(|| format!("spawn {} {subcommand} {version}", helper.display()))?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| format!("status {}", output.status));
    Err(anyhow!("tfenv {subcommand} {version} failed: {detail}"))
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn stub_helper(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("tfenv");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn explicit_version_runs_install_then_use() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let helper = stub_helper(
            dir.path(),
            &format!("echo \"$@\" >> {}\nexit 0", log.display()),
        );

        let resolution = resolve_with(&helper, "1.5.0").unwrap();
        assert_eq!(resolution, VersionResolution::Selected("1.5.0".to_string()));

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls, "install 1.5.0\nuse 1.5.0\n");
    }

    #[test]
    fn explicit_version_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let helper = stub_helper(dir.path(), "echo 'no such version' >&2\nexit 1");

        let err = resolve_with(&helper, "1.5.0").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("1.5.0"), "message was: {message}");
        assert!(message.contains("no such version"), "message was: {message}");
    }

    #[test]
    fn failing_select_of_explicit_version_is_fatal() {
        let dir = TempDir::new().unwrap();
        // install succeeds, use fails
        let helper = stub_helper(
            dir.path(),
            "if [ \"$1\" = use ]; then exit 1; fi\nexit 0",
        );
        assert!(resolve_with(&helper, "1.5.0").is_err());
    }

    #[test]
    fn latest_failure_degrades_to_skip() {
        let dir = TempDir::new().unwrap();
        let helper = stub_helper(dir.path(), "exit 1");

        let resolution = resolve_with(&helper, LATEST_VERSION).unwrap();
        assert_eq!(resolution, VersionResolution::Skipped);
    }
}
