//! HTTP transport
//!
//! A [`Transport`] performs exactly one HTTP exchange. It reports a
//! connectivity failure when no response arrives and otherwise hands back the
//! status and body untouched; mapping statuses onto [`ApiError`] variants is
//! the caller's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Method};

use super::models::ImageUpload;
use crate::error::ApiError;

/// Platform tag sent with every request
pub const PLATFORM_HEADER: &str = "X-Client-Platform";
const PLATFORM: &str = "cli";

/// Request body variants
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(ImageUpload),
}

/// A single API request, relative to the configured base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, upload: ImageUpload) -> Self {
        self.body = RequestBody::Multipart(upload);
        self
    }
}

/// A received HTTP response of any status
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    /// `Retry-After` header in seconds, when present
    pub retry_after: Option<u64>,
}

/// One HTTP exchange.
///
/// Errors are [`ApiError::Connectivity`], apart from [`ApiError::Validation`]
/// for an upload whose MIME type cannot be encoded.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    http: HttpClient,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(PLATFORM_HEADER, HeaderValue::from_static(PLATFORM));

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("solvecam/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        log::debug!("{} {}", request.method, url);

        let mut builder = self.http.request(request.method.clone(), &url);
        if let Some(ref token) = request.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        builder = match &request.body {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(upload) => {
                let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.mime_type)
                    .map_err(|e| ApiError::Validation(format!("Bad MIME type: {}", e)))?;
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        let response = builder.send().await.map_err(ApiError::from)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        // A response arrived, so a broken body is not a connectivity failure
        let body = response.text().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Could not read response body: {}", e))
        })?;

        log::debug!("{} {} -> {}", request.method, request.path, status);

        Ok(RawResponse {
            status,
            body,
            retry_after,
        })
    }
}
