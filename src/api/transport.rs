use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Method;
use serde_json::Value;

use super::error::BoxError;

/// A single file attached to a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Request payload as the platform expects it: JSON for every resource
/// except image uploads, which are multipart forms with one file part.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        file: FilePart,
    },
}

/// Status and raw body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Minimal async HTTP seam used by the publisher and the image fetcher.
///
/// Any status code is a successful exchange; only connection-level failures
/// are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        url: &str,
        bearer: Option<&str>,
        body: RequestBody,
    ) -> Result<ApiResponse, BoxError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(
        &self,
        method: Method,
        url: &str,
        bearer: Option<&str>,
        body: RequestBody,
    ) -> Result<ApiResponse, BoxError> {
        (**self).send(method, url, bearer, body).await
    }
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(
        &self,
        method: Method,
        url: &str,
        bearer: Option<&str>,
        body: RequestBody,
    ) -> Result<ApiResponse, BoxError> {
        let mut builder = self.request(method, url).header(ACCEPT, "application/json");
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { fields, file } => {
                let part = reqwest::multipart::Part::bytes(file.bytes)
                    .file_name(file.filename)
                    .mime_str(&file.mime)?;
                let form = fields
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, (k, v)| form.text(k, v))
                    .part(file.field, part);
                builder.multipart(form)
            }
        };
        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(ApiResponse::new(status, body))
    }
}
