/// Boxed lower-level cause carried by [`RequestError::Network`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub(crate) const TIMEOUT_MESSAGE: &str = "request timeout";
pub(crate) const OFFLINE_MESSAGE: &str = "offline";

/// Error type returned by this crate.
///
/// Every call either yields the parsed value or exactly one of these two
/// variants.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The server responded, but with a non-success status or a body that is
    /// not JSON.
    #[error("{message}")]
    Api {
        /// HTTP status code of the response.
        status_code: u16,
        /// Detail extracted from the error body, or the status text.
        detail: Option<String>,
        /// Human-readable summary.
        message: String,
    },
    /// No usable HTTP response was obtained.
    #[error("{message}")]
    Network {
        /// Human-readable summary.
        message: String,
        /// Underlying transport or decoding failure, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl RequestError {
    pub(crate) fn api(status_code: u16, detail: Option<String>) -> Self {
        let message = match &detail {
            Some(detail) => format!("HTTP {status_code}: {detail}"),
            None => format!("HTTP {status_code}"),
        };
        Self::Api {
            status_code,
            detail,
            message,
        }
    }

    pub(crate) fn network(message: impl Into<String>, source: Option<BoxError>) -> Self {
        Self::Network {
            message: message.into(),
            source,
        }
    }

    pub(crate) fn timeout() -> Self {
        Self::network(TIMEOUT_MESSAGE, None)
    }

    pub(crate) fn offline() -> Self {
        Self::network(OFFLINE_MESSAGE, None)
    }

    /// Status code of an [`RequestError::Api`] error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => Some(*status_code),
            Self::Network { .. } => None,
        }
    }

    /// Server-provided detail of an [`RequestError::Api`] error.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => detail.as_deref(),
            Self::Network { .. } => None,
        }
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns `true` when the call was stopped by its deadline or by the
    /// caller's cancellation token.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Network { message, .. } if message == TIMEOUT_MESSAGE)
    }

    /// Client errors (`4xx`) are never retried.
    pub(crate) fn is_client_error(&self) -> bool {
        matches!(self.status_code(), Some(400..=499))
    }
}
