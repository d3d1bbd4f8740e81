//! Gadget library resolution

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use liblzma::read::XzDecoder;
use tracing::{debug, info};

use super::{AssetProvider, ChecksumTarget, remove_quietly, validate_version};
use crate::arch::Arch;
use crate::cache::{self, compressed_gadget_file_name, gadget_file_name};
use crate::error::{GadgetError, Result, asset};
use crate::release::{FRIDA_REPOSITORY, ReleaseRef};

/// A decompressed gadget library in the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GadgetAsset {
    pub version: String,
    pub arch: Arch,
    pub path: PathBuf,
}

impl GadgetAsset {
    /// File name of the library (`frida-gadget-<v>-android-<arch>.so`)
    pub fn file_name(&self) -> String {
        gadget_file_name(&self.version, self.arch)
    }
}

impl AssetProvider<'_> {
    /// Resolve the gadget for `version` and `arch` to a local file
    ///
    /// A materialised cache entry is returned without any network request.
    /// A previously downloaded `.xz` is decompressed without re-downloading.
    pub fn gadget(&self, version: &str, arch: Arch) -> Result<GadgetAsset> {
        let version = validate_version(version)?;
        let path = self.cache.gadget_path(version, arch);
        let asset = GadgetAsset {
            version: version.to_string(),
            arch,
            path: path.clone(),
        };

        if cache::is_materialized(&path) {
            debug!("Using cached gadget {}", path.display());
            return Ok(asset);
        }

        let compressed_name = compressed_gadget_file_name(version, arch);
        let compressed = self.cache.gadget_dir(version).join(&compressed_name);

        if !cache::is_materialized(&compressed) {
            let release = self
                .source
                .release(FRIDA_REPOSITORY, ReleaseRef::Tag(version))?;
            let remote = release
                .find_asset(&compressed_name)
                .ok_or_else(|| asset::not_found(&compressed_name, version))?;

            info!("Downloading {compressed_name}");
            let target = ChecksumTarget {
                repository: FRIDA_REPOSITORY,
                release: &release,
                asset_name: &compressed_name,
                required: false,
            };
            self.download_verified(&target, &remote.browser_download_url, &compressed)?;
        }

        decompress(&compressed, &path)?;
        Ok(asset)
    }
}

/// Decompress an `.xz` file onto `dest` through a staged temporary file
///
/// A corrupt archive is removed so the next run downloads it again.
fn decompress(source: &Path, dest: &Path) -> Result<()> {
    debug!("Decompressing {} to {}", source.display(), dest.display());

    let file = File::open(source).map_err(|e| crate::error::fs::read_failed(source, &e))?;
    let mut decoder = XzDecoder::new(io::BufReader::new(file));
    let mut staged = cache::stage(dest)?;

    if let Err(e) = io::copy(&mut decoder, staged.as_file_mut()) {
        remove_quietly(source);
        return Err(GadgetError::FileReadFailed {
            path: source.display().to_string(),
            reason: format!("invalid xz archive: {e}"),
        });
    }

    cache::persist(staged, dest)
}
