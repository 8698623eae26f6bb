use thiserror::Error;

/// Boxed error returned by [`super::Transport`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised before or while talking to the platform API.
///
/// Non-2xx responses are not errors here: they surface as
/// [`super::PublishOutcome::Failed`] so the caller can carry on with
/// sibling resources.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API token is missing or empty")]
    MissingCredentials,

    #[error("invalid host id '{0}': expected letters, digits, '-' or '_'")]
    InvalidHostId(String),

    #[error("invalid API base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("cannot read upload file {path}: {source}")]
    UploadFile {
        path: String,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_names_target() {
        let e = ApiError::Transport {
            method: "POST".into(),
            url: "https://acme.example.com/ns-api/v2/domains".into(),
            source: "connection reset".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("POST"));
        assert!(msg.contains("/ns-api/v2/domains"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_transport_error_exposes_source() {
        use std::error::Error as _;
        let e = ApiError::Transport {
            method: "PUT".into(),
            url: "u".into(),
            source: "boom".into(),
        };
        assert_eq!(e.source().map(|s| s.to_string()).as_deref(), Some("boom"));
    }
}
