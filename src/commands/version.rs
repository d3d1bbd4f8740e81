//! Version command implementation

use crate::arch::Arch;
use crate::error::Result;
use crate::release::{FRIDA_REPOSITORY, SIGNER_REPOSITORY};

/// Print the version and where assets come from
pub fn run() -> Result<()> {
    println!("gadgetize {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Minimum Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!(
        "  Profile: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );
    println!();
    println!("Assets:");
    println!("  Gadget releases: {FRIDA_REPOSITORY}");
    println!("  Signer releases: {SIGNER_REPOSITORY}");
    println!("  Architectures: {}", architectures());

    Ok(())
}

fn architectures() -> String {
    Arch::ALL
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
