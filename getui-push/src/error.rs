//! Push gateway error types.

use thiserror::Error;

/// Result type for push operations.
pub type Result<T> = std::result::Result<T, PushError>;

/// Push gateway errors.
#[derive(Debug, Error)]
pub enum PushError {
    /// Network or HTTP-layer failure. Never retried.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway still reported `sign_error` after re-authenticating and
    /// replaying the request once.
    #[error("Request rejected after re-authentication: {body}")]
    AuthRejected {
        /// Body of the rejected replay.
        body: serde_json::Value,
    },

    /// The binary schema could not encode or decode a message.
    #[error("Schema error: {0}")]
    Schema(String),

    /// An action chain violates its linking invariant.
    #[error("Invalid action chain: {0}")]
    InvalidChain(String),

    /// Non-200 status without a rejection marker.
    #[error("Gateway returned status {status}: {body}")]
    UpstreamStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The message cannot be sent as given.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The gateway answered 200 but the body lacks a required field.
    #[error("Unexpected gateway response: {0}")]
    UnexpectedResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PushError {
    /// Get the HTTP status code if the gateway answered with a non-200 status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error means the encoder's schema is unusable.
    ///
    /// Schema failures point at a corrupted or mismatched descriptor and
    /// should abort rather than be reported per message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::InvalidChain(_))
    }

    /// Check if this error came from the gateway rejecting the signature.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::AuthRejected { .. })
    }
}

impl From<reqwest::Error> for PushError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for PushError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<prost::DecodeError> for PushError {
    fn from(err: prost::DecodeError) -> Self {
        Self::Schema(err.to_string())
    }
}

impl From<prost::EncodeError> for PushError {
    fn from(err: prost::EncodeError) -> Self {
        Self::Schema(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        let err = PushError::UpstreamStatus {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(PushError::Transport("reset".into()).status_code(), None);
    }

    #[test]
    fn test_fatal_errors() {
        assert!(PushError::Schema("missing field".into()).is_fatal());
        assert!(PushError::InvalidChain("dangling".into()).is_fatal());
        assert!(!PushError::Transport("reset".into()).is_fatal());
    }

    #[test]
    fn test_auth_rejection_display() {
        let err = PushError::AuthRejected {
            body: serde_json::json!({ "result": "sign_error" }),
        };
        assert!(err.is_auth_rejection());
        assert!(err.to_string().contains("sign_error"));
    }
}
