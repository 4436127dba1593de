use serde::Deserialize;

/// Error body shape understood from the server: `{"detail": ..., "message": ...}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Picks `detail`, then `message`. Strings are used verbatim; other JSON
    /// values (e.g. validation error lists) are rendered as compact JSON.
    fn into_detail(self) -> Option<String> {
        [self.detail, self.message]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(text) if text.is_empty() => None,
                serde_json::Value::String(text) => Some(text),
                other => Some(other.to_string()),
            })
    }
}

/// Extracts an error detail from a raw response body.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_detail)
}
