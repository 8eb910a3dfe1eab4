use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod artifact;
mod cli;
mod intent;
mod tool;
mod version;
mod workdir;
mod workflow;

use cli::RootArgs;
use intent::Intent;

fn main() -> Result<()> {
    let args = RootArgs::parse();

    // Intent parsing happens before anything else so an invalid boolean
    // literal aborts before a single subprocess is spawned, and so the
    // debug flag can raise the log level for the whole run.
    let intent = Intent::from_args(&args)?;
    init_tracing(intent.debug);

    workflow::run(&args, intent)
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
