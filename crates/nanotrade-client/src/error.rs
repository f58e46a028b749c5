//! Client error types.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error body the server sends with every non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got an HTTP answer (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("[{code}] {message} ({status})")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// The server answered with an error that is not an envelope.
    #[error("Unexpected response ({status}): {body}")]
    UnexpectedResponse { status: StatusCode, body: String },

    /// An endpoint needing a token was called without signing in.
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ClientError {
    /// Builds the error for a failed response body.
    pub(crate) fn from_body(status: StatusCode, body: String) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => ClientError::Api {
                status,
                code: envelope.code,
                message: envelope.message,
            },
            Err(_) => ClientError::UnexpectedResponse { status, body },
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } | ClientError::UnexpectedResponse { status, .. } => {
                Some(*status)
            }
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }

    /// Machine readable code of an API error (`NOT_FOUND`, `INSUFFICIENT_STOCK`, ...).
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True when the token is missing, expired or revoked.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::NotAuthenticated)
            || self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_is_decoded() {
        let err = ClientError::from_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":"INSUFFICIENT_STOCK","message":"Only 3 left"}"#.to_string(),
        );
        assert_eq!(err.code(), Some("INSUFFICIENT_STOCK"));
        assert_eq!(err.status(), Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_plain_text_body_is_kept() {
        let err = ClientError::from_body(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(matches!(err, ClientError::UnexpectedResponse { .. }));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_unauthorized() {
        let err = ClientError::from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"code":"UNAUTHORIZED","message":"Token revoked"}"#.to_string(),
        );
        assert!(err.is_unauthorized());
        assert!(ClientError::NotAuthenticated.is_unauthorized());
    }
}
