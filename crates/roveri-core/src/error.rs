pub use reqwest::StatusCode;
use thiserror::Error;

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {body}")]
    Unauthorized { body: serde_json::Value },
    #[error("http_{status}: {body}")]
    Validation {
        status: StatusCode,
        body: serde_json::Value,
    },
    #[error("server_http_{status}: {body}")]
    Server {
        status: StatusCode,
        body: serde_json::Value,
    },
    #[error("request_failed: {message}")]
    Network { message: String },
    #[error("json_decode_failed: {message}")]
    Decode { message: String },
    #[error("session expired, sign in again")]
    SessionExpired,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Map a non-success response to the matching error class, body untouched.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let body = parse_body(body);
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { body }
        } else if status.is_client_error() {
            ApiError::Validation { status, body }
        } else {
            ApiError::Server { status, body }
        }
    }

    /// Message extracted from a structured error body, if this error has one.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::Unauthorized { body }
            | ApiError::Validation { body, .. } => Some(body_detail(body)),
            ApiError::InvalidInput(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// Text suitable for showing the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SessionExpired => self.to_string(),
            ApiError::Server { .. }
            | ApiError::Network { .. }
            | ApiError::Decode { .. }
            | ApiError::Io(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            _ => self.detail().unwrap_or_else(|| self.to_string()),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Network {
            message: error.to_string(),
        }
    }
}

fn parse_body(bytes: &[u8]) -> serde_json::Value {
    serde_json::from_slice(bytes).unwrap_or_else(|_| {
        let text = String::from_utf8_lossy(bytes).trim().to_string();
        if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::Value::String(text)
        }
    })
}

/// `detail`, then `error`, then the raw JSON text.
fn body_detail(body: &serde_json::Value) -> String {
    for key in ["detail", "error"] {
        if let Some(text) = body.get(key).and_then(|value| value.as_str()) {
            return text.to_string();
        }
    }
    match body {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => "<empty>".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes_map_to_taxonomy() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, b"{}"),
            ApiError::Unauthorized { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, b"{}"),
            ApiError::Validation { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, b"gateway down"),
            ApiError::Server { .. }
        ));
    }

    #[test]
    fn validation_body_is_preserved() {
        let error = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            br#"{"password":["Passwords do not match."]}"#,
        );
        match &error {
            ApiError::Validation { body, .. } => {
                assert_eq!(body["password"][0], "Passwords do not match.");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            error.user_message(),
            r#"{"password":["Passwords do not match."]}"#
        );
    }

    #[test]
    fn detail_field_wins() {
        let error = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            br#"{"detail":"Email not found."}"#,
        );
        assert_eq!(error.user_message(), "Email not found.");

        let error = ApiError::from_status(StatusCode::NOT_FOUND, br#"{"error":"Pet not found"}"#);
        assert_eq!(error.detail().as_deref(), Some("Pet not found"));
    }

    #[test]
    fn server_and_network_failures_are_generic() {
        let error = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
        let error = ApiError::Network {
            message: "connection refused".to_string(),
        };
        assert_eq!(error.user_message(), GENERIC_FAILURE_MESSAGE);
    }
}
