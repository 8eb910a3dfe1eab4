//! Shared fixture for integration tests.
//!
//! Each fixture holds a scratch working directory plus a stub-binary
//! directory that is prepended to `PATH`, so the orchestrator under test
//! resolves stub `terraform`/`tfenv` scripts instead of real tools. The
//! stubs append every invocation to `calls.log`, letting tests assert
//! exactly which subcommands ran and in what order.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Scratch environment for one orchestrator run.
pub struct Fixture {
    root: TempDir,
}

/// Parsed `--summary-json` output.
#[derive(Debug, Deserialize)]
pub struct Summary {
    pub terraform_version: String,
    pub phases: Vec<PhaseEntry>,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhaseEntry {
    pub phase: String,
    pub requested: bool,
    pub ran: bool,
    pub succeeded: Option<bool>,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

impl Summary {
    pub fn phase(&self, name: &str) -> &PhaseEntry {
        self.phases
            .iter()
            .find(|entry| entry.phase == name)
            .unwrap_or_else(|| panic!("phase {name} missing from summary"))
    }
}

impl Fixture {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create fixture dir");
        std::fs::create_dir(root.path().join("bin")).expect("create bin dir");
        std::fs::create_dir(root.path().join("work")).expect("create work dir");
        Self { root }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    fn bin_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    pub fn calls_log(&self) -> PathBuf {
        self.root.path().join("calls.log")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.path().join("summary.json")
    }

    /// Install a stub binary under the fixture `bin` directory. The script
    /// body runs after a line that appends `<name> $@` to the call log.
    pub fn stub(&self, name: &str, body: &str) {
        let path = self.bin_dir().join(name);
        let script = format!(
            "#!/bin/sh\necho \"{name} $@\" >> {}\n{body}\n",
            self.calls_log().display()
        );
        write_executable(&path, &script);
    }

    /// A terraform stub whose `plan` writes the artifact and whose other
    /// subcommands succeed.
    pub fn stub_working_terraform(&self) {
        self.stub(
            "terraform",
            "case \"$1\" in\nplan) echo plan-bytes > tfplan ;;\nshow) echo '{\"format_version\":\"1.0\"}' ;;\nesac\nexit 0",
        );
    }

    pub fn calls(&self) -> String {
        std::fs::read_to_string(self.calls_log()).unwrap_or_default()
    }

    pub fn summary(&self) -> Summary {
        let text = std::fs::read_to_string(self.summary_path()).expect("read summary.json");
        serde_json::from_str(&text).expect("parse summary.json")
    }

    /// Run the orchestrator with the mandatory backend flags plus `extra`,
    /// resolving binaries against the fixture `bin` directory first.
    pub fn run(&self, extra: &[&str]) -> Output {
        let path_var = std::env::var_os("PATH").unwrap_or_default();
        let mut paths = vec![self.bin_dir()];
        paths.extend(std::env::split_paths(&path_var));
        let joined = std::env::join_paths(paths).expect("join PATH");
        self.run_with_path(extra, &joined)
    }

    /// Like `run`, but the fixture `bin` directory is the entire `PATH`, so
    /// anything not stubbed is guaranteed absent.
    pub fn run_isolated(&self, extra: &[&str]) -> Output {
        self.run_with_path(extra, &self.bin_dir().into_os_string())
    }

    fn run_with_path(&self, extra: &[&str], path_var: &std::ffi::OsStr) -> Output {
        let work_dir = self.work_dir();
        let summary = self.summary_path();
        let mut command = Command::new(env!("CARGO_BIN_EXE_tfrun"));
        command
            .args([
                "--working-directory",
                work_dir.to_str().unwrap(),
                "--summary-json",
                summary.to_str().unwrap(),
                "--state-name",
                "app.tfstate",
                "--backend-subscription-id",
                "00000000-0000-0000-0000-000000000000",
                "--backend-resource-group",
                "rg-state",
                "--backend-storage-account",
                "stworkspace",
                "--backend-container",
                "tfstate",
            ])
            .args(extra)
            .env("PATH", path_var);
        command.output().expect("spawn tfrun")
    }
}

fn write_executable(path: &Path, contents: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, contents).expect("write stub");
    let mut perms = std::fs::metadata(path).expect("stat stub").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("chmod stub");
}
