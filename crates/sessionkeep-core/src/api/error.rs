use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Unprocessable(Vec<String>),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// The `message` field of a JSON error body, if there is one.
    pub fn server_message(body: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        value
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }

    /// Field-level messages from a 422 body. `errors` may map a field to a
    /// string or to a list of strings; falls back to `message`.
    fn validation_messages(body: &str) -> Vec<String> {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let mut messages = Vec::new();

        if let Some(errors) = parsed.as_ref().and_then(|v| v.get("errors")) {
            let values: Vec<&Value> = match errors {
                Value::Object(map) => map.values().collect(),
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for value in values {
                match value {
                    Value::String(s) => messages.push(s.clone()),
                    Value::Array(items) => messages
                        .extend(items.iter().filter_map(Value::as_str).map(str::to_string)),
                    _ => {}
                }
            }
        }

        if messages.is_empty() {
            messages.push(Self::server_message(body).unwrap_or_else(|| "Validation failed".to_string()));
        }
        messages
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body).unwrap_or_else(|| Self::truncate_body(body));
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            422 => ApiError::Unprocessable(Self::validation_messages(body)),
            500..=599 => ApiError::ServerError(message),
            code => ApiError::UnexpectedStatus {
                status: code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            ApiError::MalformedRequest(e.to_string())
        } else if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            ApiError::from_status(status, "")
        } else {
            ApiError::NetworkError(e)
        }
    }
}
