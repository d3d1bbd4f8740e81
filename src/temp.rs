//! Absolute temp directory
//!
//! `std::env::temp_dir` returns `TMPDIR` as given, and a relative value would
//! put decoded APKs under whatever directory gadgetize was started from.

use std::env;
use std::path::{Path, PathBuf};

#[cfg(windows)]
const FALLBACK: &str = "C:\\Windows\\Temp";
#[cfg(not(windows))]
const FALLBACK: &str = "/tmp";

/// The system temp directory, never relative
pub fn absolute_temp_dir() -> PathBuf {
    resolve(&env::temp_dir())
}

fn resolve(candidate: &Path) -> PathBuf {
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    #[cfg(windows)]
    if let Some(dir) = env::var_os("TEMP").or_else(|| env::var_os("TMP")) {
        let dir = PathBuf::from(dir);
        if dir.is_absolute() {
            return dir;
        }
    }
    PathBuf::from(FALLBACK)
}
