//! Patch command implementation

use crate::cli::PatchArgs;
use crate::config::Config;
use crate::error::Result;
use crate::operations::{PatchOperation, PatchOptions};
use crate::release::GithubReleases;
use crate::ui;

/// Run patch command
pub fn run(config: &Config, args: &PatchArgs) -> Result<()> {
    let releases = GithubReleases::new(config)?;
    let operation = PatchOperation::new(config, &releases, PatchOptions::from(args));
    let report = operation.execute()?;

    match &report.output {
        Some(output) => {
            let message = if report.signed {
                "Gadget injected, APK rebuilt and signed:"
            } else {
                "Gadget injected and APK rebuilt:"
            };
            ui::success(message, output);
            if !report.signed {
                println!("  Sign it before installing, or rerun with --sign");
            }
        }
        None => {
            ui::success("Gadget injected, decoded tree left at:", &report.tree);
            println!("  Rebuild it with --skip-decompile");
        }
    }

    Ok(())
}
