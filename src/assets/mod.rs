//! Image fetcher: pulls one source image with bounded retry on rate
//! limiting, then derives a fixed set of stretched RGB JPEG variants.
//!
//! `Fetching → {Decoding → Deriving → Done} | {RateLimited → sleep → Fetching} | Failed`

pub mod derive;
pub mod error;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::Method;
use url::Url;

use crate::api::{RequestBody, Transport};
use crate::retry::{self, RetryAction, RetryConfig};
pub use error::FetchError;

pub const OUTPUT_EXTENSION: &str = "jpg";

/// Sizes the UI image slots need.
pub const DEFAULT_SIZES: [ImageSize; 3] = [
    ImageSize::new(192, 192),
    ImageSize::new(512, 512),
    ImageSize::new(250, 150),
];

/// Target pixel dimensions of a derived variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `"{width}x{height}"`
    pub fn label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.label(), OUTPUT_EXTENSION)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FetchError::InvalidSize(s.to_string());
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.parse().map_err(|_| invalid())?;
        let height: u32 = h.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self::new(width, height))
    }
}

/// Where the source image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(Url),
    Path(PathBuf),
}

impl ImageSource {
    /// `http(s)://` inputs are URLs; anything else is a local path that must exist.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let input = input.trim();
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(input).map_err(|source| FetchError::InvalidUrl {
                url: input.to_string(),
                source,
            })?;
            return Ok(ImageSource::Url(url));
        }
        let path = crate::config::expand_tilde(input);
        if !path.is_file() {
            return Err(FetchError::MissingSource(path));
        }
        Ok(ImageSource::Path(path))
    }

    pub fn describe(&self) -> String {
        match self {
            ImageSource::Url(url) => url.to_string(),
            ImageSource::Path(path) => path.display().to_string(),
        }
    }
}

/// One resized copy of the source image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAsset {
    pub size: ImageSize,
    pub path: PathBuf,
}

/// Variants keyed by their `WxH` label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedAssetSet {
    assets: BTreeMap<String, DerivedAsset>,
}

impl DerivedAssetSet {
    pub(crate) fn insert(&mut self, asset: DerivedAsset) {
        self.assets.insert(asset.size.label(), asset);
    }

    pub fn get(&self, size: ImageSize) -> Option<&DerivedAsset> {
        self.assets.get(&size.label())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DerivedAsset> {
        self.assets.values()
    }
}

/// Fetches source images through a [`Transport`] with backoff on 429.
pub struct ImageFetcher<'a> {
    transport: &'a dyn Transport,
    retry: RetryConfig,
}

impl<'a> ImageFetcher<'a> {
    pub fn new(transport: &'a dyn Transport, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }

    /// Fetch the raw bytes of `source`.
    ///
    /// URLs get up to `max_attempts` GETs; only 429 is retried, sleeping
    /// `2^attempt` seconds in between. Local paths are read once.
    pub async fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>, FetchError> {
        let url = match source {
            ImageSource::Path(path) => {
                return match tokio::fs::read(path).await {
                    Ok(bytes) => Ok(bytes),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(FetchError::MissingSource(path.clone()))
                    }
                    Err(e) => Err(FetchError::Disk(e)),
                };
            }
            ImageSource::Url(url) => url,
        };

        let result = retry::retry_with_backoff(
            &self.retry,
            |e: &FetchError| {
                if e.is_retryable() {
                    RetryAction::Retry
                } else {
                    RetryAction::Abort
                }
            },
            |attempt| self.attempt_fetch(url, attempt),
        )
        .await;

        result.map_err(|e| {
            if e.is_retryable() {
                FetchError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: self.retry.max_attempts.max(1),
                    last_error: e.to_string(),
                }
            } else {
                e
            }
        })
    }

    /// Single GET; the status code decides the [`FetchError`] variant.
    async fn attempt_fetch(&self, url: &Url, attempt: u32) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .transport
            .send(Method::GET, url.as_str(), None, RequestBody::Empty)
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;
        tracing::debug!(url = %url, attempt, status = resp.status, "image fetch attempt");

        match resp.status {
            200 => Ok(resp.body),
            429 => Err(FetchError::RateLimited {
                url: url.to_string(),
                attempt,
            }),
            status => Err(FetchError::HttpStatus {
                status,
                url: url.to_string(),
            }),
        }
    }

    /// Fetch `source`, then write one `{w}x{h}.jpg` per size into `out_dir`.
    ///
    /// Nothing is written unless the fetch and decode both succeed.
    pub async fn fetch_and_derive(
        &self,
        source: &ImageSource,
        sizes: &[ImageSize],
        out_dir: &Path,
    ) -> Result<DerivedAssetSet, FetchError> {
        let bytes = self.fetch(source).await?;
        let origin = source.describe();
        let sizes = sizes.to_vec();
        let out_dir = out_dir.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let img = derive::decode_rgb(&bytes, &origin)?;
            derive::write_variants(&img, &sizes, &out_dir)
        })
        .await?
    }
}
