//! Asset cache for gadget libraries and the signing tool
//!
//! Downloads are kept across runs so a gadget is fetched once per
//! version and architecture.
//!
//! ## Cache Structure
//!
//! ```text
//! ~/.cache/gadgetize/
//! ├── gadgets/
//! │   └── <version>/
//! │       ├── frida-gadget-<version>-android-<arch>.so.xz
//! │       └── frida-gadget-<version>-android-<arch>.so
//! └── signer/
//!     ├── uber-apk-signer-<version>.jar
//!     └── uber-apk-signer-<version>.sha256
//! ```
//!
//! Entries are written through a temporary file and renamed into place, so
//! a reader sees either nothing or a complete file. Presence with non-zero
//! size is what marks an entry as usable; there is no lock.

mod paths;
mod stats;

pub use paths::{
    GADGETS_DIR, SIGNER_DIR, compressed_gadget_file_name, default_cache_dir,
    gadget_file_name,
};
pub use stats::{CacheStats, CachedEntry, EntryKind};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::arch::Arch;
use crate::error::{GadgetError, Result, asset};

/// Handle to a cache root directory
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the gadgets of one release
    pub fn gadget_dir(&self, version: &str) -> PathBuf {
        self.root.join(GADGETS_DIR).join(version)
    }

    /// Final, decompressed gadget path for a version and architecture
    pub fn gadget_path(&self, version: &str, arch: Arch) -> PathBuf {
        self.gadget_dir(version).join(gadget_file_name(version, arch))
    }

    pub fn signer_dir(&self) -> PathBuf {
        self.root.join(SIGNER_DIR)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        stats::cache_stats(&self.root)
    }

    /// List every cached file
    pub fn entries(&self) -> Result<Vec<CachedEntry>> {
        stats::list_entries(&self.root)
    }

    /// Clear the whole cache, or only the gadgets of one version
    pub fn clear(&self, only_version: Option<&str>) -> Result<()> {
        match only_version {
            Some(version) => stats::remove_version(&self.root, version),
            None => stats::clear_cache(&self.root),
        }
    }
}

/// Whether a cache entry is present and usable
pub fn is_materialized(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}

/// Ensure parent directory exists for a path
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| asset::cache_failed(format!(
            "Failed to create {}: {}",
            parent.display(),
            e
        )))?;
    }
    Ok(())
}

/// Stage a temporary file next to `path`, for an atomic [`persist`]
pub fn stage(path: &Path) -> Result<NamedTempFile> {
    ensure_parent_dir(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    NamedTempFile::new_in(dir).map_err(|e| asset::cache_failed(format!(
        "Failed to create temporary file in {}: {}",
        dir.display(),
        e
    )))
}

/// Flush a staged file and rename it onto `path`
pub fn persist(mut staged: NamedTempFile, path: &Path) -> Result<()> {
    staged
        .as_file_mut()
        .flush()
        .map_err(|e| crate::error::fs::write_failed(path, &e))?;
    staged
        .persist(path)
        .map_err(|e| GadgetError::FileWriteFailed {
            path: path.display().to_string(),
            reason: e.error.to_string(),
        })?;
    Ok(())
}
