//! Cache statistics and management
//!
//! This module provides functions for listing, removing, and
//! getting statistics about cached assets.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{GadgetError, Result};

use super::{GADGETS_DIR, SIGNER_DIR};

/// What a cached file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Gadget,
    Signer,
}

/// Cached file information
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub kind: EntryKind,
    /// Release version the file belongs to (gadgets only)
    pub version: Option<String>,
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

impl CachedEntry {
    /// Format size as human-readable string
    pub fn formatted_size(&self) -> String {
        format_size(self.size)
    }
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of cached gadget releases
    pub versions: usize,
    /// Number of cached files
    pub files: usize,
    /// Total size in bytes
    pub total_size: u64,
}

impl CacheStats {
    /// Format total size as human-readable string
    pub fn formatted_size(&self) -> String {
        format_size(self.total_size)
    }
}

fn format_size(bytes: u64) -> String {
    let size = bytes as f64;
    if size < 1024.0 {
        format!("{bytes} B")
    } else if size < 1024.0 * 1024.0 {
        format!("{:.1} KB", size / 1024.0)
    } else if size < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.1} MB", size / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", size / (1024.0 * 1024.0 * 1024.0))
    }
}

fn cache_error(action: &str, e: impl std::fmt::Display) -> GadgetError {
    GadgetError::CacheOperationFailed {
        message: format!("{action}: {e}"),
    }
}

/// List all cached files, gadgets first, each group sorted by name
pub fn list_entries(root: &Path) -> Result<Vec<CachedEntry>> {
    let mut entries = Vec::new();

    let gadgets = root.join(GADGETS_DIR);
    if gadgets.is_dir() {
        for version_dir in fs::read_dir(&gadgets)
            .map_err(|e| cache_error("Failed to read cache directory", e))?
        {
            let version_dir =
                version_dir.map_err(|e| cache_error("Failed to read entry", e))?;
            if !version_dir.path().is_dir() {
                continue;
            }
            let version = version_dir.file_name().to_string_lossy().to_string();
            for (name, size) in files_in(&version_dir.path())? {
                entries.push(CachedEntry {
                    kind: EntryKind::Gadget,
                    version: Some(version.clone()),
                    name,
                    size,
                });
            }
        }
    }

    let signer = root.join(SIGNER_DIR);
    if signer.is_dir() {
        for (name, size) in files_in(&signer)? {
            entries.push(CachedEntry {
                kind: EntryKind::Signer,
                version: None,
                name,
                size,
            });
        }
    }

    entries.sort_by(|a, b| {
        (a.kind == EntryKind::Signer, &a.version, &a.name).cmp(&(
            b.kind == EntryKind::Signer,
            &b.version,
            &b.name,
        ))
    });
    Ok(entries)
}

fn files_in(dir: &Path) -> Result<Vec<(String, u64)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| cache_error("Failed to read directory", e))? {
        let entry = entry.map_err(|e| cache_error("Failed to read entry", e))?;
        let meta = entry
            .metadata()
            .map_err(|e| cache_error("Failed to get metadata", e))?;
        if meta.is_file() {
            files.push((entry.file_name().to_string_lossy().to_string(), meta.len()));
        }
    }
    Ok(files)
}

/// Get cache statistics
pub fn cache_stats(root: &Path) -> Result<CacheStats> {
    let mut stats = CacheStats::default();

    let gadgets = root.join(GADGETS_DIR);
    if gadgets.is_dir() {
        for entry in
            fs::read_dir(&gadgets).map_err(|e| cache_error("Failed to read cache directory", e))?
        {
            let entry = entry.map_err(|e| cache_error("Failed to read entry", e))?;
            if entry.path().is_dir() {
                stats.versions += 1;
            }
        }
    }

    if root.is_dir() {
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            if entry.file_type().is_file() {
                stats.files += 1;
                stats.total_size += entry
                    .metadata()
                    .map_err(|e| cache_error("Failed to get metadata", e))?
                    .len();
            }
        }
    }

    Ok(stats)
}

/// Remove the cached gadgets of one release version
pub fn remove_version(root: &Path, version: &str) -> Result<()> {
    let path = root.join(GADGETS_DIR).join(version);

    if version.contains(['/', '\\']) || version.starts_with('.') || !path.is_dir() {
        return Err(GadgetError::CacheOperationFailed {
            message: format!("Version not found in cache: {version}"),
        });
    }

    fs::remove_dir_all(&path).map_err(|e| cache_error("Failed to remove cached version", e))
}

/// Clear the entire cache
pub fn clear_cache(root: &Path) -> Result<()> {
    for dir in [GADGETS_DIR, SIGNER_DIR] {
        let path = root.join(dir);
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|e| cache_error("Failed to clear cache", e))?;
        }
    }
    Ok(())
}
