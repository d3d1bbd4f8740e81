//! Native library placement inside a decoded tree

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::arch::Arch;
use crate::error::{GadgetError, Result};
use crate::smali::library_name_from_file;

/// Directory of native libraries inside a decoded tree
pub const LIB_DIR: &str = "lib";

/// File name the platform loads for a library name (`lib<name>.so`)
pub fn placed_file_name(gadget_file_name: &str) -> String {
    format!("lib{}.so", library_name_from_file(gadget_file_name))
}

/// Copy the gadget into `<tree>/lib/<abi>/lib<name>.so`
pub fn place_library(tree: &Path, arch: Arch, gadget: &Path) -> Result<PathBuf> {
    let file_name = gadget
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| crate::error::fs::not_found(gadget))?;

    let abi_dir = tree.join(LIB_DIR).join(arch.abi_dir());
    fs::create_dir_all(&abi_dir).map_err(|e| crate::error::fs::write_failed(&abi_dir, &e))?;

    let dest = abi_dir.join(placed_file_name(&file_name));
    fs::copy(gadget, &dest).map_err(|e| GadgetError::FileWriteFailed {
        path: dest.display().to_string(),
        reason: format!("copy from {}: {e}", gadget.display()),
    })?;

    debug!("Placed {} at {}", file_name, dest.display());
    Ok(dest)
}
