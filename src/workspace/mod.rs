//! Work directory holding a decoded APK
//!
//! ## Layout
//!
//! ```text
//! <temp>/gadgetize/<apk stem>-<path hash>/
//! ├── AndroidManifest.xml
//! ├── smali/ smali_classes2/ ...   # disassembly roots
//! ├── lib/<abi>/                   # native libraries
//! └── dist/<apk name>              # rebuilt package
//! ```
//!
//! The directory name is derived from the canonical input path, so the same
//! APK always maps to the same tree and `--skip-decompile` can find it again.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{GadgetError, Result};
use crate::manifest::MANIFEST_FILE;

/// Directory under the temp base holding all work trees
pub const WORK_DIR: &str = "gadgetize";

/// Directory apktool writes rebuilt packages to
pub const DIST_DIR: &str = "dist";

/// Hex characters of the path hash kept in the directory name
const HASH_LEN: usize = 12;

/// A decoded APK on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnpackedTree {
    root: PathBuf,
}

impl UnpackedTree {
    /// Tree for `apk` under `base`
    pub fn for_apk(base: &Path, apk: &Path) -> Result<Self> {
        let canonical = dunce::canonicalize(apk).map_err(|_| GadgetError::ApkNotFound {
            path: apk.display().to_string(),
        })?;
        Ok(Self {
            root: base.join(WORK_DIR).join(work_dir_name(&canonical)),
        })
    }

    #[cfg(test)]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Disassembly roots in probe order
    pub fn smali_roots(&self) -> Result<Vec<PathBuf>> {
        crate::smali::disassembly_roots(&self.root)
    }

    /// Where the rebuilt package for `apk_name` lands
    pub fn output_apk(&self, apk_name: &str) -> PathBuf {
        self.root.join(DIST_DIR).join(apk_name)
    }

    /// Remove any previous tree so the decoder starts clean
    pub fn recreate(&self) -> Result<()> {
        if self.root.exists() {
            debug!("Removing previous work tree {}", self.root.display());
            fs::remove_dir_all(&self.root)
                .map_err(|e| crate::error::fs::write_failed(&self.root, &e))?;
        }
        if let Some(parent) = self.root.parent() {
            fs::create_dir_all(parent).map_err(|e| crate::error::fs::write_failed(parent, &e))?;
        }
        Ok(())
    }

    /// Fail unless a previously decoded tree exists
    pub fn require_existing(&self) -> Result<()> {
        if self.manifest_path().is_file() {
            Ok(())
        } else {
            Err(GadgetError::WorkDirMissing {
                path: self.root.display().to_string(),
            })
        }
    }
}

/// `<stem>-<first 12 hex of sha256(path)>`
fn work_dir_name(canonical: &Path) -> String {
    let stem = canonical
        .file_stem()
        .map_or_else(|| "apk".to_string(), |s| s.to_string_lossy().to_string());
    let digest = hex::encode(Sha256::digest(canonical.to_string_lossy().as_bytes()));
    format!("{stem}-{}", &digest[..HASH_LEN])
}
