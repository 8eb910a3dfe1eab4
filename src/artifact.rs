//! Plan artifact paths and end-of-run cleanup.
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the binary plan artifact written by `terraform plan -out`.
pub const PLAN_FILE: &str = "tfplan";
/// File name of the JSON rendering produced by `terraform show -json`.
pub const PLAN_JSON_FILE: &str = "tfplan.json";

/// The two artifact files a run creates and consumes, anchored at the
/// working directory.
#[derive(Debug, Clone)]
pub struct PlanArtifacts {
    plan: PathBuf,
    plan_json: PathBuf,
}

impl PlanArtifacts {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            plan: work_dir.join(PLAN_FILE),
            plan_json: work_dir.join(PLAN_JSON_FILE),
        }
    }

    pub fn plan_path(&self) -> &Path {
        &self.plan
    }

    pub fn plan_json_path(&self) -> &Path {
        &self.plan_json
    }

    /// Whether the binary plan artifact currently exists. Checked after a
    /// planning phase (success criterion) and again immediately before an
    /// apply (gate).
    pub fn plan_exists(&self) -> bool {
        self.plan.is_file()
    }

    /// Best-effort removal of both artifact files. Each removal is attempted
    /// independently; a failure is logged and never aborts the run.
    pub fn cleanup(&self) {
        for path in [&self.plan, &self.plan_json] {
            match fs::remove_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed plan artifact"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "failed to remove plan artifact");
                }
            }
        }
    }
}
