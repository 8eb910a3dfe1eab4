//! CLI argument parsing for the Terraform run orchestrator.
//!
//! The CLI is intentionally thin: every flag is captured as the caller
//! supplied it, and the boolean-typed flags stay raw strings here so the
//! intent parser can reject anything that is not a strict true/false
//! literal before a single subprocess is spawned.
use clap::Parser;
use std::path::PathBuf;

/// Sentinel accepted by `--terraform-version` meaning "newest available".
pub const LATEST_VERSION: &str = "latest";

/// Root CLI entrypoint for a single orchestrated Terraform run.
#[derive(Parser, Debug)]
#[command(
    name = "tfrun",
    version,
    about = "Gated Terraform run orchestrator (init/plan/apply/destroy sequencing)",
    after_help = "Examples:\n  tfrun --state-name app.tfstate \\\n        --backend-subscription-id SUB --backend-resource-group RG \\\n        --backend-storage-account ACCT --backend-container tfstate\n  tfrun --run-apply true --working-directory infra/prod \\\n        --state-name app.tfstate --backend-subscription-id SUB \\\n        --backend-resource-group RG --backend-storage-account ACCT \\\n        --backend-container tfstate\n  tfrun --run-plan false --run-plan-destroy true --run-destroy true \\\n        --state-name app.tfstate --backend-subscription-id SUB \\\n        --backend-resource-group RG --backend-storage-account ACCT \\\n        --backend-container tfstate"
)]
pub struct RootArgs {
    /// Run `terraform init` before planning ("true"/"false")
    #[arg(long, value_name = "BOOL", default_value = "true")]
    pub run_init: String,

    /// Run `terraform plan` and write the plan artifact ("true"/"false")
    #[arg(long, value_name = "BOOL", default_value = "true")]
    pub run_plan: String,

    /// Run `terraform plan -destroy` instead of a forward plan ("true"/"false")
    #[arg(long, value_name = "BOOL", default_value = "false")]
    pub run_plan_destroy: String,

    /// Apply the plan artifact produced in this run ("true"/"false")
    #[arg(long, value_name = "BOOL", default_value = "false")]
    pub run_apply: String,

    /// Apply the destroy-mode plan artifact produced in this run ("true"/"false")
    #[arg(long, value_name = "BOOL", default_value = "false")]
    pub run_destroy: String,

    /// Directory containing the Terraform module; all phases run here
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub working_directory: PathBuf,

    /// Enable verbose diagnostic output ("true"/"false")
    #[arg(long, value_name = "BOOL", default_value = "false")]
    pub debug_mode: String,

    /// Delete the plan artifact and its JSON rendering after the run ("true"/"false")
    #[arg(long, value_name = "BOOL", default_value = "true")]
    pub delete_plan_files: String,

    /// Terraform version to pin via tfenv, or "latest"
    #[arg(long, value_name = "VERSION", default_value = LATEST_VERSION)]
    pub terraform_version: String,

    /// Backend state key (blob name) for the remote state file
    #[arg(long, value_name = "NAME", required = true)]
    pub state_name: String,

    /// Subscription id of the backend storage account
    #[arg(long, value_name = "ID", required = true)]
    pub backend_subscription_id: String,

    /// Resource group containing the backend storage account
    #[arg(long, value_name = "GROUP", required = true)]
    pub backend_resource_group: String,

    /// Storage account holding the remote state container
    #[arg(long, value_name = "ACCOUNT", required = true)]
    pub backend_storage_account: String,

    /// Blob container holding the remote state file
    #[arg(long, value_name = "CONTAINER", required = true)]
    pub backend_container: String,

    /// Optional path for a machine-readable per-phase run summary
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,
}

/// Remote-state backend identifiers, passed through to `terraform init`
/// unmodified. The orchestrator never inspects these beyond clap's
/// required-argument enforcement.
#[derive(Debug, Clone)]
pub struct BackendRef {
    pub subscription_id: String,
    pub resource_group: String,
    pub storage_account: String,
    pub container: String,
    pub state_key: String,
}

impl BackendRef {
    pub fn from_args(args: &RootArgs) -> Self {
        Self {
            subscription_id: args.backend_subscription_id.clone(),
            resource_group: args.backend_resource_group.clone(),
            storage_account: args.backend_storage_account.clone(),
            container: args.backend_container.clone(),
            state_key: args.state_name.clone(),
        }
    }
}
