use std::path::PathBuf;

use thiserror::Error;

use crate::api::error::BoxError;

/// Typed fetch errors enabling retry classification.
///
/// Only rate limiting is transient; every other failure ends the fetch on
/// the attempt that produced it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited fetching {url} (attempt {attempt})")]
    RateLimited { url: String, attempt: u32 },

    #[error("HTTP error {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("gave up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("image source not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("invalid image URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("invalid image size '{0}': expected WIDTHxHEIGHT with non-zero dimensions")]
    InvalidSize(String),

    #[error("cannot decode image from {origin}: {source}")]
    Decode {
        origin: String,
        source: image::ImageError,
    },

    #[error("cannot write {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("image worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl FetchError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_retryable() {
        let e = FetchError::RateLimited {
            url: "x".into(),
            attempt: 0,
        };
        assert!(e.is_retryable());
    }

    #[test]
    fn test_http_status_not_retryable() {
        for status in [400, 401, 403, 404, 500, 502, 503] {
            let e = FetchError::HttpStatus {
                status,
                url: "x".into(),
            };
            assert!(!e.is_retryable(), "status {status}");
        }
    }

    #[test]
    fn test_network_not_retryable() {
        let e = FetchError::Network {
            url: "x".into(),
            source: "dns failure".into(),
        };
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_disk_not_retryable() {
        let e = FetchError::Disk(std::io::Error::other("disk full"));
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_missing_source_message_names_path() {
        let e = FetchError::MissingSource(PathBuf::from("/tmp/logo.png"));
        assert!(e.to_string().contains("/tmp/logo.png"));
    }
}
