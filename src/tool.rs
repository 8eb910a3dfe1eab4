//! Terraform subprocess invocations.
//!
//! One blocking subprocess per phase, always pinned to the working
//! directory. Subprocess stdout/stderr stream through to the operator;
//! only `terraform show -json` is captured, since its stdout is the JSON
//! rendering of the plan artifact.
use crate::artifact::{PlanArtifacts, PLAN_FILE, PLAN_JSON_FILE};
use crate::cli::BackendRef;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Instant;

/// Name of the provisioning tool binary resolved on `PATH`.
pub const TOOL: &str = "terraform";

/// Runs terraform subcommands from a fixed working directory.
#[derive(Debug)]
pub struct ToolRunner {
    program: PathBuf,
    work_dir: PathBuf,
}

impl ToolRunner {
    /// Resolve the terraform binary. Missing terraform is fatal and aborts
    /// the run before any phase.
    pub fn locate(work_dir: &Path) -> Result<Self> {
        let program = which::which(TOOL)
            .map_err(|err| anyhow!("{TOOL} not found on PATH: {err}"))?;
        tracing::debug!(program = %program.display(), "located provisioning tool");
        Ok(Self::with_program(program, work_dir))
    }

    /// Runner against an explicit binary; used by tests with stub scripts.
    pub fn with_program(program: PathBuf, work_dir: &Path) -> Self {
        Self {
            program,
            work_dir: work_dir.to_path_buf(),
        }
    }

    /// `terraform init` with the azurerm backend parameters.
    pub fn init(&self, backend: &BackendRef) -> Result<ExitStatus> {
        self.run_streamed(
            "init",
            &[
                "init".to_string(),
                format!("-backend-config=subscription_id={}", backend.subscription_id),
                format!(
                    "-backend-config=resource_group_name={}",
                    backend.resource_group
                ),
                format!(
                    "-backend-config=storage_account_name={}",
                    backend.storage_account
                ),
                format!("-backend-config=container_name={}", backend.container),
                format!("-backend-config=key={}", backend.state_key),
            ],
        )
    }

    /// `terraform plan -out=tfplan`, with `-destroy` when planning a
    /// teardown. If the artifact was produced, render it to JSON as well.
    pub fn plan(&self, destroy_mode: bool, artifacts: &PlanArtifacts) -> Result<ExitStatus> {
        let mut args = vec!["plan".to_string()];
        if destroy_mode {
            args.push("-destroy".to_string());
        }
        args.push(format!("-out={PLAN_FILE}"));
        let status = self.run_streamed(if destroy_mode { "plan -destroy" } else { "plan" }, &args)?;

        if artifacts.plan_exists() {
            self.render_plan_json(artifacts)?;
        }
        Ok(status)
    }

    /// `terraform apply -auto-approve tfplan`. The caller has already
    /// verified the artifact exists; auto-approval is safe because the apply
    /// executes exactly the reviewed plan file.
    pub fn apply_plan(&self) -> Result<ExitStatus> {
        self.run_streamed(
            "apply",
            &[
                "apply".to_string(),
                "-auto-approve".to_string(),
                PLAN_FILE.to_string(),
            ],
        )
    }

    /// `terraform show -json tfplan` captured into `tfplan.json`. A failed
    /// rendering is reported but does not fail the planning phase; the
    /// binary artifact is the one the apply consumes.
    fn render_plan_json(&self, artifacts: &PlanArtifacts) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["show", "-json", PLAN_FILE])
            .current_dir(&self.work_dir)
            .output()
            .with_context(|| format!("spawn {TOOL} show -json"))?;
        if !output.status.success() {
            tracing::warn!(
                status = %output.status,
                "{TOOL} show -json failed; skipping {PLAN_JSON_FILE}"
            );
            return Ok(());
        }
        std::fs::write(artifacts.plan_json_path(), &output.stdout).with_context(|| {
            format!("write plan JSON {}", artifacts.plan_json_path().display())
        })?;
        tracing::debug!(
            bytes = output.stdout.len(),
            path = %artifacts.plan_json_path().display(),
            "rendered plan artifact to JSON"
        );
        Ok(())
    }

    fn run_streamed(&self, label: &str, args: &[String]) -> Result<ExitStatus> {
        tracing::debug!(command = %format!("{TOOL} {}", args.join(" ")), "invoking");
        let start = Instant::now();
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.work_dir)
            .status()
            .with_context(|| format!("spawn {TOOL} {label}"))?;
        let elapsed_ms = start.elapsed().as_millis();
        tracing::info!(phase = label, elapsed_ms, status = %exit_status_string(&status), "terraform finished");
        Ok(status)
    }
}

pub fn exit_status_string(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        format!("{code}")
    } else {
        "terminated by signal".to_string()
    }
}
