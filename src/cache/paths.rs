//! Cache path utilities and constants
//!
//! This module provides path-related utilities for the cache system,
//! including directory structure constants and path resolution functions.

use std::path::PathBuf;

use crate::arch::Arch;
use crate::error::{GadgetError, Result};

/// Default cache directory name under user's cache directory
pub const CACHE_DIR: &str = "gadgetize";

/// Gadget libraries subdirectory within cache
pub const GADGETS_DIR: &str = "gadgets";

/// Signing tool subdirectory within cache
pub const SIGNER_DIR: &str = "signer";

/// Get the default cache directory path
///
/// Uses the platform's standard cache location (e.g. XDG on Linux, Library/Caches on macOS)
/// with a `gadgetize` subdirectory. Can be overridden with the `GADGETIZE_CACHE_DIR`
/// environment variable.
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Ok(cache_dir) = std::env::var("GADGETIZE_CACHE_DIR") {
        if !cache_dir.trim().is_empty() {
            return Ok(PathBuf::from(cache_dir));
        }
    }

    let base = dirs::cache_dir().ok_or_else(|| GadgetError::CacheOperationFailed {
        message: "Could not determine cache directory".to_string(),
    })?;

    Ok(base.join(CACHE_DIR))
}

/// Decompressed gadget file name (e.g. `frida-gadget-16.1.4-android-arm64.so`)
pub fn gadget_file_name(version: &str, arch: Arch) -> String {
    format!("frida-gadget-{version}-android-{}.so", arch.asset_name())
}

/// Release asset name of the compressed gadget
pub fn compressed_gadget_file_name(version: &str, arch: Arch) -> String {
    format!("{}.xz", gadget_file_name(version, arch))
}
