//! gadgetize - inject the Frida gadget into Android APKs
//!
//! Decodes an APK with apktool, makes its launch activity load the Frida
//! gadget before any application code runs, and rebuilds the package.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod apktool;
mod arch;
mod assets;
mod cache;
mod cli;
mod commands;
mod config;
mod error;
mod hash;
mod manifest;
mod operations;
mod placement;
mod progress;
mod release;
mod smali;
mod temp;
#[cfg(test)]
mod test_fixtures;
mod ui;
mod workspace;

use cli::{Cli, Commands};
use config::Config;
use error::Result;

/// Send diagnostics to stderr; `RUST_LOG` takes precedence over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "gadgetize=debug" } else { "gadgetize=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(&args),
        Commands::Patch(args) => commands::patch::run(&Config::from_env()?, &args),
        Commands::Cache(args) => commands::cache::run(&Config::from_env()?, args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
