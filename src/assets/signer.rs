//! Re-signing tool resolution (uber-apk-signer)

use std::path::PathBuf;

use tracing::{debug, info};

use super::{AssetProvider, ChecksumTarget};
use crate::cache;
use crate::error::{Result, asset};
use crate::release::{ReleaseRef, SIGNER_REPOSITORY};

impl AssetProvider<'_> {
    /// Resolve the latest uber-apk-signer jar to a verified local file
    ///
    /// Unlike gadgets, the signer is only accepted with a published checksum.
    pub fn signer(&self) -> Result<PathBuf> {
        let release = self
            .source
            .release(SIGNER_REPOSITORY, ReleaseRef::Latest)?;
        let jar = release
            .assets
            .iter()
            .find(|a| a.name.starts_with("uber-apk-signer") && a.name.ends_with(".jar"))
            .ok_or_else(|| asset::not_found("uber-apk-signer-*.jar", release.version()))?;

        let path = self.cache.signer_dir().join(&jar.name);
        if cache::is_materialized(&path) {
            debug!("Using cached signer {}", path.display());
            return Ok(path);
        }

        info!("Downloading {}", jar.name);
        let target = ChecksumTarget {
            repository: SIGNER_REPOSITORY,
            release: &release,
            asset_name: &jar.name,
            required: true,
        };
        self.download_verified(&target, &jar.browser_download_url, &path)?;
        Ok(path)
    }
}
