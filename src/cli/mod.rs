//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - patch: Patch command arguments
//! - cache: Cache command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

pub mod cache;
pub mod completions;
pub mod patch;

pub use cache::{CacheArgs, CacheSubcommand};
pub use completions::CompletionsArgs;
pub use patch::PatchArgs;

/// gadgetize - inject the Frida gadget into Android APKs
#[derive(Parser, Debug)]
#[command(
    name = "gadgetize",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Inject the Frida gadget into Android APKs",
    long_about = "gadgetize decodes an APK with apktool, makes its launch activity load the \
                  Frida gadget before any application code runs, and rebuilds the package. \
                  No root access is needed on the device.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  gadgetize patch app.apk                      \x1b[90m# Inject the latest arm64 gadget\x1b[0m\n   \
                  gadgetize patch app.apk --arch x86_64 --sign \x1b[90m# Emulator build, re-signed\x1b[0m\n   \
                  gadgetize cache list                         \x1b[90m# List downloaded gadgets\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inject the gadget into an APK
    Patch(PatchArgs),

    /// Manage the gadget cache
    #[command(name = "cache")]
    Cache(CacheArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
