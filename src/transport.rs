//! Asynchronous HTTP transport capability used by [`RequestClient`](crate::RequestClient).
//!
//! A transport performs exactly one HTTP exchange per call. Cancellation is
//! expressed by dropping the returned future.

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap},
    Method, StatusCode,
};

use crate::error::BoxError;

/// One outbound HTTP request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// A fully read HTTP response.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    /// Raw `content-type` header value, if present.
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, content_type: Option<&str>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_owned),
            body: body.into(),
        }
    }

    /// Shorthand for an `application/json` response.
    pub fn json(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status, Some("application/json"), body)
    }

    pub(crate) fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
    }

    /// Text of the status line, used when the error body carries no detail.
    pub(crate) fn status_text(&self) -> String {
        self.status
            .canonical_reason()
            .map(str::to_owned)
            .unwrap_or_else(|| self.status.as_u16().to_string())
    }
}

/// Failure to obtain any HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport gave up waiting on its own.
    #[error("transport timeout: {0}")]
    Timeout(#[source] BoxError),
    /// Connection, protocol or body read failure.
    #[error("transport error: {0}")]
    Failed(#[source] BoxError),
}

/// Sends HTTP requests on behalf of the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`.
///
/// No per-request timeout is applied here; the client owns the deadline.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing `reqwest` client (connection pool, proxies, TLS).
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(Box::new(err))
        } else {
            Self::Failed(Box::new(err))
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
