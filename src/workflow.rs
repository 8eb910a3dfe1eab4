//! The phase executor: sequences Init, Plan/PlanDestroy, and Apply/Destroy
//! for one run.
//!
//! Ordering and gating rules:
//! - Gates are validated before anything is spawned.
//! - Version resolution happens once, then the terraform presence check,
//!   then the phases in fixed order.
//! - Init failure short-circuits every later phase.
//! - Apply/Destroy require their planning phase to have produced the plan
//!   artifact in this same run; a missing artifact skips the subprocess and
//!   reports an error, never a silent no-op.
//! - The artifact janitor runs exactly once after the phases, even when a
//!   phase failed.
//!
//! Subprocess outcomes are reduced to booleans threaded through the gating
//! table; only precondition failures (bad flags, missing terraform, a
//! failed directory switch, an unspawnable subprocess) propagate as errors.
use crate::artifact::PlanArtifacts;
use crate::cli::{BackendRef, RootArgs};
use crate::intent::Intent;
use crate::tool::{exit_status_string, ToolRunner};
use crate::version::{self, VersionResolution};
use crate::workdir::WorkdirScope;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::Path;

/// Per-phase outcome for the machine-readable run summary.
#[derive(Debug, Serialize)]
pub struct PhaseReport {
    pub phase: &'static str,
    pub requested: bool,
    pub ran: bool,
    pub succeeded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl PhaseReport {
    fn skipped(phase: &'static str, requested: bool, reason: &str) -> Self {
        Self {
            phase,
            requested,
            ran: false,
            succeeded: None,
            skip_reason: Some(reason.to_string()),
        }
    }

    fn finished(phase: &'static str, succeeded: bool) -> Self {
        Self {
            phase,
            requested: true,
            ran: true,
            succeeded: Some(succeeded),
            skip_reason: None,
        }
    }
}

/// Whole-run summary, optionally written as JSON via `--summary-json`.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub terraform_version: String,
    pub phases: Vec<PhaseReport>,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run the whole orchestration: version pinning, presence check, phases,
/// and cleanup. Returns `Err` (non-zero exit) on any fatal precondition or
/// when a requested phase failed.
pub fn run(args: &RootArgs, intent: Intent) -> Result<()> {
    intent.validate()?;

    let scope = WorkdirScope::enter(&args.working_directory)?;

    let resolution = version::resolve(&args.terraform_version)?;
    let runner = ToolRunner::locate(scope.dir())?;
    let backend = BackendRef::from_args(args);
    let artifacts = PlanArtifacts::new(scope.dir());

    let executed = execute_phases(&intent, &runner, &backend, &artifacts, &resolution, args);

    // Best-effort, after all phases, regardless of their outcomes.
    if intent.delete_plan_files {
        artifacts.cleanup();
    }

    let summary = executed?;
    if let Some(path) = &args.summary_json {
        write_summary(path, &summary)?;
    }

    if summary.ok() {
        tracing::info!("run complete");
        Ok(())
    } else {
        Err(anyhow!("run failed: {}", summary.errors.join("; ")))
    }
}

fn execute_phases(
    intent: &Intent,
    runner: &ToolRunner,
    backend: &BackendRef,
    artifacts: &PlanArtifacts,
    resolution: &VersionResolution,
    args: &RootArgs,
) -> Result<RunSummary> {
    let mut phases = Vec::new();
    let mut errors = Vec::new();

    // Init. Not requested counts as satisfied; only a failed Init
    // short-circuits the chain.
    let mut init_ok = true;
    if intent.init {
        let status = runner.init(backend)?;
        init_ok = status.success();
        if !init_ok {
            let message = format!(
                "terraform init failed with status {}",
                exit_status_string(&status)
            );
            tracing::error!("{message}");
            errors.push(message);
        }
        phases.push(PhaseReport::finished("init", init_ok));
    } else {
        phases.push(PhaseReport::skipped("init", false, "not requested"));
    }

    let plan_ok = planning_phase(
        "plan",
        intent.plan,
        false,
        init_ok,
        runner,
        artifacts,
        &mut phases,
        &mut errors,
    )?;
    let plan_destroy_ok = planning_phase(
        "plan-destroy",
        intent.plan_destroy,
        true,
        init_ok,
        runner,
        artifacts,
        &mut phases,
        &mut errors,
    )?;

    apply_phase(
        "apply",
        intent.apply,
        plan_ok,
        "plan",
        runner,
        artifacts,
        &mut phases,
        &mut errors,
    )?;
    apply_phase(
        "destroy",
        intent.destroy,
        plan_destroy_ok,
        "plan-destroy",
        runner,
        artifacts,
        &mut phases,
        &mut errors,
    )?;

    Ok(RunSummary {
        terraform_version: match resolution {
            VersionResolution::Selected(version) => version.clone(),
            VersionResolution::Skipped => args.terraform_version.clone(),
        },
        phases,
        errors,
    })
}

/// Plan or PlanDestroy. Success means the plan artifact exists after the
/// invocation, not merely a zero exit status.
#[allow(clippy::too_many_arguments)]
fn planning_phase(
    label: &'static str,
    requested: bool,
    destroy_mode: bool,
    init_ok: bool,
    runner: &ToolRunner,
    artifacts: &PlanArtifacts,
    phases: &mut Vec<PhaseReport>,
    errors: &mut Vec<String>,
) -> Result<bool> {
    if !requested {
        phases.push(PhaseReport::skipped(label, false, "not requested"));
        return Ok(false);
    }
    if !init_ok {
        let message = format!("{label} skipped: init failed");
        tracing::error!("{message}");
        errors.push(message.clone());
        phases.push(PhaseReport::skipped(label, true, "init failed"));
        return Ok(false);
    }

    let status = runner.plan(destroy_mode, artifacts)?;
    let produced = artifacts.plan_exists();
    if !produced {
        let message = format!(
            "terraform {label} did not produce a plan artifact (status {})",
            exit_status_string(&status)
        );
        tracing::error!("{message}");
        errors.push(message);
    }
    phases.push(PhaseReport::finished(label, produced));
    Ok(produced)
}

/// Apply or Destroy; both apply the plan artifact auto-approved. Destroy is
/// realized by applying the destroy-mode plan, so the artifact gate is
/// identical for both directions.
#[allow(clippy::too_many_arguments)]
fn apply_phase(
    label: &'static str,
    requested: bool,
    planning_ok: bool,
    planning_label: &'static str,
    runner: &ToolRunner,
    artifacts: &PlanArtifacts,
    phases: &mut Vec<PhaseReport>,
    errors: &mut Vec<String>,
) -> Result<()> {
    if !requested {
        phases.push(PhaseReport::skipped(label, false, "not requested"));
        return Ok(());
    }
    if !planning_ok {
        let message = format!("{label} skipped: {planning_label} did not succeed in this run");
        tracing::error!("{message}");
        errors.push(message.clone());
        phases.push(PhaseReport::skipped(label, true, "planning phase failed"));
        return Ok(());
    }
    // Re-checked at the instant before invocation.
    if !artifacts.plan_exists() {
        let message = format!(
            "{label} skipped: plan artifact {} is missing",
            artifacts.plan_path().display()
        );
        tracing::error!("{message}");
        errors.push(message.clone());
        phases.push(PhaseReport::skipped(label, true, "plan artifact missing"));
        return Ok(());
    }

    let status = runner.apply_plan()?;
    let succeeded = status.success();
    if !succeeded {
        let message = format!(
            "terraform {label} failed with status {}",
            exit_status_string(&status)
        );
        tracing::error!("{message}");
        errors.push(message);
    }
    phases.push(PhaseReport::finished(label, succeeded));
    Ok(())
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("write run summary {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote run summary");
    Ok(())
}
