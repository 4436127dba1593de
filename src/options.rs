use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use tokio_util::sync::CancellationToken;

/// Configures the call deadline and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Deadline in milliseconds for a whole call, retries and backoff included.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_delay_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 2,
            retry_delay_ms: 1_000,
        }
    }
}

impl ClientOptions {
    /// Reads option overrides from the environment.
    ///
    /// Reads (all optional, unset keeps the default):
    /// - `API_TIMEOUT_MS`
    /// - `API_MAX_RETRIES`
    /// - `API_RETRY_DELAY_MS`
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            timeout_ms: parse_var(&lookup, "API_TIMEOUT_MS")?.unwrap_or(defaults.timeout_ms),
            max_retries: parse_var(&lookup, "API_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            retry_delay_ms: parse_var(&lookup, "API_RETRY_DELAY_MS")?
                .unwrap_or(defaults.retry_delay_ms),
        })
    }

    /// Zero durations are raised to one millisecond.
    pub(crate) fn normalized(mut self) -> Self {
        self.timeout_ms = self.timeout_ms.max(1);
        self.retry_delay_ms = self.retry_delay_ms.max(1);
        self
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> std::result::Result<Option<T>, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("{key} must be a non-negative integer, got '{raw}'")),
    }
}

/// Per-call overrides for [`RequestClient::request`](crate::RequestClient::request).
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    /// Merged over the default `Content-Type: application/json`.
    pub headers: HeaderMap,
    /// Pre-serialized request body.
    pub body: Option<String>,
    /// Caller-side cancellation; treated like the call deadline firing.
    pub cancellation: Option<CancellationToken>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
            cancellation: None,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
