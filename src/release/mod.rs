//! Remote release index
//!
//! Gadgets and the signing tool are published as GitHub release assets. The
//! [`ReleaseSource`] trait is the seam the asset provider talks to; the
//! production implementation is [`GithubReleases`], tests substitute their own.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{GadgetError, Result};
use crate::progress;

/// Repository publishing the Frida gadget
pub const FRIDA_REPOSITORY: &str = "frida/frida";

/// Repository publishing uber-apk-signer
pub const SIGNER_REPOSITORY: &str = "patrickfav/uber-apk-signer";

/// Chunk size for streamed downloads
const CHUNK_SIZE: usize = 8192;

/// One published release
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file of a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// Release version without a leading `v` (`v1.3.0` -> `1.3.0`)
    pub fn version(&self) -> &str {
        self.tag_name
            .strip_prefix('v')
            .unwrap_or(&self.tag_name)
    }

    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Which release of a repository to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseRef<'a> {
    Latest,
    Tag(&'a str),
}

/// Access to a release index and its downloads
pub trait ReleaseSource {
    /// Fetch release metadata
    fn release(&self, repository: &str, release: ReleaseRef<'_>) -> Result<Release>;

    /// Stream the asset at `url` into `dest`, returning the byte count
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

/// GitHub releases API client
///
/// Responses are cached per endpoint for the lifetime of the value, so asking
/// for the same release twice in one run costs one round trip.
pub struct GithubReleases {
    client: Client,
    api_base: String,
    token: Option<String>,
    query_timeout: Duration,
    download_timeout: Duration,
    responses: RefCell<HashMap<String, Release>>,
}

impl GithubReleases {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gadgetize/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.query_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            token: config.github_token.clone(),
            query_timeout: config.query_timeout,
            download_timeout: config.download_timeout,
            responses: RefCell::new(HashMap::new()),
        })
    }

    fn endpoint(&self, repository: &str, release: ReleaseRef<'_>) -> String {
        match release {
            ReleaseRef::Latest => format!("{}/repos/{repository}/releases/latest", self.api_base),
            ReleaseRef::Tag(tag) => {
                format!("{}/repos/{repository}/releases/tags/{tag}", self.api_base)
            }
        }
    }

    fn query(&self, endpoint: &str) -> Result<Option<Release>> {
        debug!("GET {endpoint}");
        let mut request = self
            .client
            .get(endpoint)
            .header("Accept", "application/vnd.github+json")
            .timeout(self.query_timeout);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.error_for_status()?.text()?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

impl ReleaseSource for GithubReleases {
    fn release(&self, repository: &str, release: ReleaseRef<'_>) -> Result<Release> {
        let endpoint = self.endpoint(repository, release);

        if let Some(cached) = self.responses.borrow().get(&endpoint) {
            debug!("Using cached response for {endpoint}");
            return Ok(cached.clone());
        }

        let fetched = self
            .query(&endpoint)?
            .ok_or_else(|| GadgetError::ReleaseNotFound {
                repository: repository.to_string(),
                tag: match release {
                    ReleaseRef::Latest => "latest".to_string(),
                    ReleaseRef::Tag(tag) => tag.to_string(),
                },
            })?;

        self.responses
            .borrow_mut()
            .insert(endpoint, fetched.clone());
        Ok(fetched)
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        debug!("Downloading {url}");
        let mut response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()?
            .error_for_status()?;

        let name = url.rsplit('/').next().unwrap_or(url);
        let progress = progress::download_progress(response.content_length(), name);

        let mut buffer = [0u8; CHUNK_SIZE];
        let mut written = 0u64;
        loop {
            let read = response.read(&mut buffer).map_err(|e| GadgetError::Http {
                message: format!("{url}: {e}"),
            })?;
            if read == 0 {
                break;
            }
            dest.write_all(&buffer[..read])?;
            written += read as u64;
            progress.inc(read as u64);
        }

        progress.finish_and_clear();
        Ok(written)
    }
}
