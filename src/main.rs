use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xcode_version::{cli, workflow};

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    init_tracing(args.verbose);

    match &args.command {
        cli::Command::Get(args) => workflow::run_get(args),
        cli::Command::Targets(args) => workflow::run_targets(args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
