use thiserror::Error;

/// Errors returned by the order API client.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    ///
    /// `message` is the server's own explanation when the body carried one.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl OrdersError {
    /// `true` for a 4xx refusal: the request itself was unacceptable.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, OrdersError::Rejected { status, .. } if (400..500).contains(status))
    }

    /// Text suitable for showing to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            OrdersError::Rejected { message, .. } => message.clone(),
            OrdersError::Http(e) if e.is_timeout() => {
                "The order service did not respond in time. Please try again.".to_owned()
            }
            OrdersError::Http(_) => {
                "Could not reach the order service. Please try again.".to_owned()
            }
            OrdersError::Deserialize { .. } | OrdersError::InvalidBaseUrl { .. } => {
                "Failed to create order. Please try again.".to_owned()
            }
        }
    }
}

/// Pulls a readable message out of an error response body.
///
/// Looks for `detail`, `error`, or `message` first, then falls back to
/// field-level validation errors of the form `{"field": ["msg", ...]}`.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    match &value {
        serde_json::Value::Object(map) => {
            for key in ["detail", "error", "message"] {
                if let Some(text) = map.get(key).and_then(serde_json::Value::as_str) {
                    if !text.trim().is_empty() {
                        return Some(text.trim().to_owned());
                    }
                }
            }

            let fields: Vec<String> = map
                .iter()
                .filter_map(|(field, v)| {
                    let msg = join_messages(v)?;
                    if field == "non_field_errors" {
                        Some(msg)
                    } else {
                        Some(format!("{field}: {msg}"))
                    }
                })
                .collect();
            (!fields.is_empty()).then(|| fields.join("; "))
        }
        other => join_messages(other),
    }
}

fn join_messages(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        serde_json::Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        _ => None,
    }
}
