//! Asset provider
//!
//! Resolves the native gadget for a (version, arch) pair and the optional
//! re-signing tool to local, ready-to-use files. Everything lands in the
//! [`Cache`] first; a materialised cache entry is returned without touching
//! the network.

mod gadget;
mod signer;

pub use gadget::GadgetAsset;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::cache::{self, Cache};
use crate::error::{GadgetError, Result, asset};
use crate::hash;
use crate::release::{Release, ReleaseRef, ReleaseSource};

/// Name of the aggregate checksum file some releases publish
pub const CHECKSUM_FILE: &str = "checksum-sha256.txt";

/// Fetches and caches release assets
pub struct AssetProvider<'a> {
    cache: Cache,
    source: &'a dyn ReleaseSource,
}

impl<'a> AssetProvider<'a> {
    pub fn new(cache: Cache, source: &'a dyn ReleaseSource) -> Self {
        Self { cache, source }
    }

    /// The requested version, or the latest published one
    pub fn resolve_version(&self, repository: &str, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(version) => validate_version(version).map(str::to_string),
            None => {
                let release = self.source.release(repository, ReleaseRef::Latest)?;
                debug!("Latest release of {repository}: {}", release.tag_name);
                Ok(release.version().to_string())
            }
        }
    }

    /// Download `url` to `path` unless `path` is already materialised
    fn download_to(&self, url: &str, path: &Path) -> Result<()> {
        if cache::is_materialized(path) {
            debug!("Already downloaded: {}", path.display());
            return Ok(());
        }

        let mut staged = cache::stage(path)?;
        let written = self.source.download(url, staged.as_file_mut())?;
        debug!("Downloaded {written} bytes to {}", path.display());
        cache::persist(staged, path)
    }

    /// Download a release asset and persist it onto `path` once verified
    ///
    /// The artifact stays in a staged temporary file until its checksum has
    /// been checked, so an interrupted or failed verification never leaves
    /// anything at `path`.
    fn download_verified(
        &self,
        target: &ChecksumTarget<'_>,
        url: &str,
        path: &Path,
    ) -> Result<()> {
        let mut staged = cache::stage(path)?;
        let written = self.source.download(url, staged.as_file_mut())?;
        staged
            .as_file_mut()
            .flush()
            .map_err(|e| crate::error::fs::write_failed(staged.path(), &e))?;
        debug!("Downloaded {written} bytes for {}", path.display());

        let checksum_path = path.with_extension("sha256");
        self.verify_published_checksum(target, staged.path(), &checksum_path)?;
        cache::persist(staged, path)
    }

    /// Verify `artifact` against the checksum published for the target asset
    ///
    /// Looks for `<asset_name>.sha256` first, then [`CHECKSUM_FILE`]. When
    /// neither exists, or the checksum file does not cover the asset, the
    /// artifact is accepted unless `required` is set. On mismatch the
    /// downloaded checksum file is removed; the caller discards the artifact.
    fn verify_published_checksum(
        &self,
        target: &ChecksumTarget<'_>,
        artifact: &Path,
        checksum_path: &Path,
    ) -> Result<()> {
        let ChecksumTarget {
            repository,
            release,
            asset_name,
            required,
        } = *target;
        let missing = || GadgetError::ChecksumMissing {
            repository: repository.to_string(),
            version: release.version().to_string(),
            name: asset_name.to_string(),
        };

        let sidecar = format!("{asset_name}.sha256");
        let Some(checksum_asset) = release
            .find_asset(&sidecar)
            .or_else(|| release.find_asset(CHECKSUM_FILE))
        else {
            if required {
                return Err(missing());
            }
            debug!("No checksum published for {asset_name}");
            return Ok(());
        };

        self.download_to(&checksum_asset.browser_download_url, checksum_path)?;

        let contents = crate::error::fs::read_to_string(checksum_path)?;
        let Some(expected) = hash::parse_checksum(&contents, asset_name) else {
            remove_quietly(checksum_path);
            if required {
                return Err(missing());
            }
            warn!("{} does not list {asset_name}", checksum_asset.name);
            return Ok(());
        };

        let actual = hash::sha256_file(artifact)?;
        if hash::verify_hash(&expected, &actual) {
            debug!("Checksum verified for {asset_name}");
            Ok(())
        } else {
            remove_quietly(checksum_path);
            Err(asset::checksum_mismatch(asset_name, expected, actual))
        }
    }
}

/// Which published asset a download must match
#[derive(Clone, Copy)]
struct ChecksumTarget<'r> {
    repository: &'r str,
    release: &'r Release,
    asset_name: &'r str,
    /// Refuse the artifact when no checksum covers it
    required: bool,
}

/// Reject empty release identifiers
pub fn validate_version(version: &str) -> Result<&str> {
    let trimmed = version.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return Err(GadgetError::InvalidVersion {
            version: version.to_string(),
        });
    }
    Ok(trimmed)
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {e}", path.display()),
    }
}
