//! Client for the platform's `/ns-api/v2` REST surface.
//!
//! Credentials and the base URL are explicit values handed to
//! [`ApiClient::new`]; nothing is read from process-wide state, so tests can
//! inject fake tokens and a scripted [`Transport`].

pub mod error;
pub mod publish;
pub mod transport;

use reqwest::Method;

pub use error::ApiError;
pub use publish::{ConflictPolicy, ConflictSignal, PublishMode, PublishOutcome, ResourceDescriptor};
pub use transport::{ApiResponse, FilePart, RequestBody, Transport};

/// Default platform domain; each tenant lives at `{host_id}.{base_domain}`.
pub const DEFAULT_BASE_DOMAIN: &str = "trynetsapiens.com";

const API_PREFIX: &str = "/ns-api/v2";

/// Bearer token for the platform API.
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Result<Self, ApiError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ApiError::MissingCredentials);
        }
        Ok(Self { token })
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Where to send requests and how to authenticate them.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    host_id: String,
    server: String,
    base_url: String,
    credentials: Credentials,
}

impl ApiConfig {
    /// Build the config for tenant `host_id` on `https://{host_id}.{base_domain}`.
    pub fn for_host(
        host_id: &str,
        base_domain: &str,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        validate_host_id(host_id)?;
        let server = format!("{}.{}", host_id, base_domain.trim_matches('.'));
        let origin = format!("https://{}", server);
        let mut config = Self::with_origin(&origin, credentials)?;
        config.host_id = host_id.to_string();
        config.server = server;
        Ok(config)
    }

    /// Build a config against an explicit origin such as `http://127.0.0.1:8080`.
    pub fn with_origin(origin: &str, credentials: Credentials) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(origin).map_err(|source| ApiError::InvalidBaseUrl {
            url: origin.to_string(),
            source,
        })?;
        let host = parsed.host_str().unwrap_or_default().to_string();
        let host_id = host.split('.').next().unwrap_or_default().to_string();
        let base_url = format!("{}{}", origin.trim_end_matches('/'), API_PREFIX);
        Ok(Self {
            host_id,
            server: host,
            base_url,
            credentials,
        })
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Fully qualified server name, e.g. `acme.trynetsapiens.com`.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Host ids end up in a DNS name, so only word characters and `-` are allowed.
pub fn validate_host_id(host_id: &str) -> Result<(), ApiError> {
    let ok = !host_id.is_empty()
        && host_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ApiError::InvalidHostId(host_id.to_string()))
    }
}

/// Authenticated client bound to one tenant.
pub struct ApiClient {
    config: ApiConfig,
    transport: Box<dyn Transport>,
}

impl ApiClient {
    pub fn new(config: ApiConfig, transport: Box<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The underlying transport, for unauthenticated requests such as image fetches.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(path);
        self.transport
            .send(
                method.clone(),
                &url,
                Some(self.config.credentials.token()),
                body,
            )
            .await
            .map_err(|source| ApiError::Transport {
                method: method.to_string(),
                url,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::bearer("tok").unwrap()
    }

    #[test]
    fn test_empty_token_rejected() {
        assert!(matches!(
            Credentials::bearer("   "),
            Err(ApiError::MissingCredentials)
        ));
    }

    #[test]
    fn test_token_is_trimmed_and_redacted() {
        let c = Credentials::bearer(" nss_abc \n").unwrap();
        assert_eq!(c.token(), "nss_abc");
        let dbg = format!("{:?}", c);
        assert!(!dbg.contains("nss_abc"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_for_host_builds_tenant_urls() {
        let config = ApiConfig::for_host("acme", DEFAULT_BASE_DOMAIN, creds()).unwrap();
        assert_eq!(config.host_id(), "acme");
        assert_eq!(config.server(), "acme.trynetsapiens.com");
        assert_eq!(
            config.base_url(),
            "https://acme.trynetsapiens.com/ns-api/v2"
        );
    }

    #[test]
    fn test_invalid_host_id_rejected() {
        for bad in ["", "acme/evil", "a b", "acme.example"] {
            assert!(
                matches!(
                    ApiConfig::for_host(bad, DEFAULT_BASE_DOMAIN, creds()),
                    Err(ApiError::InvalidHostId(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_with_origin_rejects_malformed_url() {
        assert!(matches!(
            ApiConfig::with_origin("not a url", creds()),
            Err(ApiError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_url_joins_paths() {
        let config = ApiConfig::with_origin("http://127.0.0.1:9000/", creds()).unwrap();
        let client = ApiClient::new(config, Box::new(reqwest::Client::new()));
        assert_eq!(
            client.url("/domains/acme/users"),
            "http://127.0.0.1:9000/ns-api/v2/domains/acme/users"
        );
        assert_eq!(
            client.url("resellers"),
            "http://127.0.0.1:9000/ns-api/v2/resellers"
        );
    }
}
