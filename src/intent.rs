//! Intent parsing and gate validation.
//!
//! The boolean flags arrive as raw strings and are parsed strictly: only a
//! case-insensitive `true`/`false` literal is accepted, and any other value
//! aborts the run before any subprocess is spawned. The gate rules reject
//! flag combinations that would apply a plan never computed in this run, or
//! attempt both directions of change at once.
use crate::cli::RootArgs;
use anyhow::{anyhow, Result};

/// Immutable intent vector for one orchestrated run, built once from the
/// raw CLI strings.
#[derive(Debug, Clone, Copy)]
pub struct Intent {
    pub init: bool,
    pub plan: bool,
    pub plan_destroy: bool,
    pub apply: bool,
    pub destroy: bool,
    pub delete_plan_files: bool,
    pub debug: bool,
}

impl Intent {
    pub fn from_args(args: &RootArgs) -> Result<Self> {
        Ok(Self {
            init: parse_bool("--run-init", &args.run_init)?,
            plan: parse_bool("--run-plan", &args.run_plan)?,
            plan_destroy: parse_bool("--run-plan-destroy", &args.run_plan_destroy)?,
            apply: parse_bool("--run-apply", &args.run_apply)?,
            destroy: parse_bool("--run-destroy", &args.run_destroy)?,
            delete_plan_files: parse_bool("--delete-plan-files", &args.delete_plan_files)?,
            debug: parse_bool("--debug-mode", &args.debug_mode)?,
        })
    }

    /// Enforce the mutual-exclusion and pairing rules. Each rule is checked
    /// independently and any violation is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.plan && self.plan_destroy {
            return Err(anyhow!(
                "--run-plan and --run-plan-destroy are mutually exclusive: both planning modes target the same plan artifact"
            ));
        }
        if self.apply && self.destroy {
            return Err(anyhow!(
                "--run-apply and --run-destroy are mutually exclusive terminal actions"
            ));
        }
        if self.apply && !self.plan {
            return Err(anyhow!(
                "--run-apply requires --run-plan: applying a plan artifact left over from a prior run is rejected"
            ));
        }
        if self.destroy && !self.plan_destroy {
            return Err(anyhow!(
                "--run-destroy requires --run-plan-destroy: destroying without a destroy-mode plan from this run is rejected"
            ));
        }
        Ok(())
    }
}

/// Parse a strict boolean flag literal, case-insensitively.
pub fn parse_bool(flag: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(anyhow!(
            "invalid value {raw:?} for {flag}: expected \"true\" or \"false\""
        )),
    }
}
