use std::{fmt, future, sync::Arc, time::Duration};

use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::sleep;

use crate::{
    connectivity::{AlwaysOnline, Connectivity},
    error::TIMEOUT_MESSAGE,
    transport::{HttpRequest, ReqwestTransport, Transport, TransportError},
    wire, ClientOptions, RequestError, RequestOptions, Result,
};

#[derive(Clone)]
/// Typed JSON client for one backend base address.
///
/// Each call gets a single deadline of [`ClientOptions::timeout_ms`] that
/// covers every attempt and every backoff wait. Client errors (`4xx`) and the
/// deadline end a call immediately; everything else is retried up to
/// [`ClientOptions::max_retries`] times with exponential backoff.
///
/// The client holds no per-call state and can be shared between concurrent
/// tasks.
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
    base_address: String,
    options: ClientOptions,
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("base_address", &self.base_address)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RequestClient {
    /// Creates a client for `base_address` with default options.
    ///
    /// Trailing slashes are stripped; endpoints are appended verbatim.
    pub fn new(base_address: impl AsRef<str>) -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new()),
            connectivity: Arc::new(AlwaysOnline),
            base_address: normalize_base_address(base_address.as_ref()),
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `API_BASE_URL` (required) plus the optional overrides documented
    /// on [`ClientOptions::from_env`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use resilient_request::RequestClient;
    ///
    /// let api = RequestClient::from_env().expect("missing API_BASE_URL");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("API_BASE_URL")
            .ok_or_else(|| "missing API_BASE_URL environment variable".to_owned())?;
        if base.trim().is_empty() {
            return Err("API_BASE_URL is set but empty".to_owned());
        }
        let options = ClientOptions::from_lookup(lookup)?;
        Ok(Self::new(base.trim()).with_options(options))
    }

    /// Applies timeout and retry options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts.normalized();
        self
    }

    /// Replaces the HTTP transport.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replaces the offline detector.
    pub fn with_connectivity(mut self, connectivity: impl Connectivity + 'static) -> Self {
        self.connectivity = Arc::new(connectivity);
        self
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.get_with(endpoint, RequestOptions::default()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(endpoint, RequestOptions { method: Method::GET, ..options })
            .await
    }

    /// Sends `body` as JSON with `POST`.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_with(endpoint, Some(body), RequestOptions::default())
            .await
    }

    pub async fn post_with<T, B>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = with_json_body(RequestOptions { method: Method::POST, ..options }, body)?;
        self.request(endpoint, options).await
    }

    /// Sends `body` as JSON with `PUT`.
    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.put_with(endpoint, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put_with<T, B>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = with_json_body(RequestOptions { method: Method::PUT, ..options }, body)?;
        self.request(endpoint, options).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.delete_with(endpoint, RequestOptions::default()).await
    }

    pub async fn delete_with<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(endpoint, RequestOptions { method: Method::DELETE, ..options })
            .await
    }

    /// Executes one logical request against `base_address + endpoint`.
    ///
    /// Returns the parsed JSON body, an [`RequestError::Api`] or an
    /// [`RequestError::Network`]. The deadline and the optional cancellation
    /// token abort an in-flight attempt or backoff wait and end the call with
    /// a timeout error regardless of the remaining retry budget.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let RequestOptions {
            method,
            headers,
            body,
            cancellation,
        } = options;
        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_address, endpoint),
            headers: merge_headers(headers),
            body,
        };

        // One timer per call, shared by all attempts and backoff waits.
        let deadline = sleep(Duration::from_millis(self.options.timeout_ms));
        tokio::pin!(deadline);
        let cancelled = async {
            match &cancellation {
                Some(token) => token.cancelled().await,
                None => future::pending().await,
            }
        };
        tokio::pin!(cancelled);

        let max_retries = self.options.max_retries;
        let mut last_api_error = None;
        let mut last_failure = None;

        for attempt in 0..=max_retries {
            let outcome = if self.connectivity.is_online() {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    method = %request.method,
                    url = %request.url,
                    attempt,
                    "sending request"
                );

                tokio::select! {
                    biased;
                    _ = &mut cancelled => return Err(self.interrupted(endpoint)),
                    _ = &mut deadline => return Err(self.interrupted(endpoint)),
                    outcome = self.attempt(endpoint, request.clone()) => outcome,
                }
            } else {
                Err(RequestError::offline())
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if err.is_client_error() || err.is_timeout() {
                return Err(err);
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(endpoint, attempt, error = %err, "attempt failed");

            if err.is_api() {
                last_api_error = Some(err);
            } else {
                last_failure = Some(err);
            }

            if attempt < max_retries {
                let delay_ms = backoff_delay_ms(self.options.retry_delay_ms, attempt);

                #[cfg(feature = "tracing")]
                tracing::debug!(endpoint, delay_ms, "retrying");

                tokio::select! {
                    biased;
                    _ = &mut cancelled => return Err(self.interrupted(endpoint)),
                    _ = &mut deadline => return Err(self.interrupted(endpoint)),
                    _ = sleep(Duration::from_millis(delay_ms)) => {}
                }
            }
        }

        let err = last_api_error
            .or(last_failure)
            .unwrap_or_else(|| RequestError::network("request failed", None));

        #[cfg(feature = "tracing")]
        tracing::warn!(endpoint, error = %err, "retries exhausted");

        Err(err)
    }

    async fn attempt<T: DeserializeOwned>(&self, endpoint: &str, request: HttpRequest) -> Result<T> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(classify_transport_error)?;
        let status = response.status.as_u16();

        if !response.status.is_success() {
            let detail = wire::error_detail(&response.body).unwrap_or_else(|| response.status_text());
            return Err(RequestError::api(status, Some(detail)));
        }

        if !response.is_json() {
            return Err(RequestError::api(
                status,
                Some(format!("non-JSON response from {endpoint}")),
            ));
        }

        serde_json::from_str(&response.body).map_err(|err| {
            RequestError::network(
                format!("invalid JSON response from {endpoint}: {err}"),
                Some(Box::new(err)),
            )
        })
    }

    fn interrupted(&self, endpoint: &str) -> RequestError {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            endpoint,
            timeout_ms = self.options.timeout_ms,
            "request timed out or was cancelled"
        );

        #[cfg(not(feature = "tracing"))]
        let _ = endpoint;

        RequestError::timeout()
    }
}

fn classify_transport_error(err: TransportError) -> RequestError {
    match err {
        TransportError::Timeout(_) => RequestError::network(TIMEOUT_MESSAGE, Some(Box::new(err))),
        TransportError::Failed(_) => {
            RequestError::network(format!("network error: {err}"), Some(Box::new(err)))
        }
    }
}

fn with_json_body<B>(mut options: RequestOptions, body: Option<&B>) -> Result<RequestOptions>
where
    B: Serialize + ?Sized,
{
    if let Some(body) = body {
        let encoded = serde_json::to_string(body).map_err(|err| {
            RequestError::network("failed to serialize request body", Some(Box::new(err)))
        })?;
        options.body = Some(encoded);
    }
    Ok(options)
}

/// Caller headers win over the default `Content-Type: application/json`.
fn merge_headers(overrides: HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(overrides.len() + 1);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let mut current = None;
    for (name, value) in overrides {
        if let Some(name) = name {
            headers.remove(&name);
            current = Some(name);
        }
        if let Some(name) = &current {
            headers.append(name.clone(), value);
        }
    }
    headers
}

fn backoff_delay_ms(base_ms: u64, attempt: usize) -> u64 {
    let exp = u32::try_from(attempt).unwrap_or(u32::MAX);
    base_ms.saturating_mul(2u64.saturating_pow(exp))
}

fn normalize_base_address(base: &str) -> String {
    base.trim_end_matches('/').to_owned()
}
