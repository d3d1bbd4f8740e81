//! Run configuration
//!
//! Everything a run depends on from the environment is resolved once here and
//! passed into the components, so nothing reads process-wide state later.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache;
use crate::error::Result;
use crate::temp::absolute_temp_dir;

/// Default GitHub API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Timeout for release index queries
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for binary downloads
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the on-disk asset cache
    pub cache_dir: PathBuf,
    /// Base URL of the release index API
    pub api_base: String,
    /// Bearer token sent to the release index, if any
    pub github_token: Option<String>,
    /// Directory the per-APK work trees are created under
    pub work_base: PathBuf,
    pub query_timeout: Duration,
    pub download_timeout: Duration,
}

impl Config {
    /// Build the configuration from the environment
    ///
    /// - `GADGETIZE_CACHE_DIR` overrides the cache root
    /// - `GADGETIZE_GITHUB_API` overrides the API base URL
    /// - `GITHUB_TOKEN` is used for authenticated requests
    /// - `GADGETIZE_WORK_DIR` overrides the base of the work trees
    pub fn from_env() -> Result<Self> {
        let api_base = std::env::var("GADGETIZE_GITHUB_API")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let work_base = std::env::var("GADGETIZE_WORK_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map_or_else(absolute_temp_dir, PathBuf::from);

        Ok(Self {
            cache_dir: cache::default_cache_dir()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            github_token,
            work_base,
            query_timeout: QUERY_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
        })
    }

    /// Configuration rooted at an explicit cache directory, with default endpoints
    #[cfg(test)]
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            api_base: DEFAULT_API_BASE.to_string(),
            github_token: None,
            work_base: absolute_temp_dir(),
            query_timeout: QUERY_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        // SAFETY: tests touching the environment are serialized
        unsafe {
            std::env::set_var("GADGETIZE_CACHE_DIR", temp.path());
            std::env::set_var("GADGETIZE_GITHUB_API", "http://127.0.0.1:9/");
            std::env::set_var("GADGETIZE_WORK_DIR", temp.path().join("work"));
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.cache_dir, temp.path());
        assert_eq!(config.api_base, "http://127.0.0.1:9");
        assert_eq!(config.work_base, temp.path().join("work"));

        unsafe {
            std::env::remove_var("GADGETIZE_CACHE_DIR");
            std::env::remove_var("GADGETIZE_GITHUB_API");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        unsafe {
            std::env::remove_var("GADGETIZE_GITHUB_API");
            std::env::remove_var("GADGETIZE_WORK_DIR");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.work_base.is_absolute());
        assert_eq!(config.query_timeout, QUERY_TIMEOUT);
        assert_eq!(config.download_timeout, DOWNLOAD_TIMEOUT);
    }
}
