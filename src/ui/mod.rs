//! User-facing status output
//!
//! Pipeline steps and results are printed to stdout with the same styling
//! the CLI help uses. Diagnostics go through `tracing` on stderr instead.

use std::path::Path;

use console::Style;

/// Announce a pipeline step
pub fn step(message: &str) {
    println!("{} {}", Style::new().cyan().bold().apply_to("→"), message);
}

/// Print a labelled value (e.g. `APK: app.apk`)
pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("{} {}", Style::new().bold().apply_to(label), value);
}

/// Announce a finished run with the produced path
pub fn success(message: &str, output: &Path) {
    println!(
        "{} {}",
        Style::new().green().bold().apply_to("✓"),
        Style::new().bold().apply_to(message)
    );
    println!("  {}", output.display());
}
