//! Error types for functions-runtime

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use thiserror::Error;

/// Startup errors. The hosting binary decides whether these abort the process.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A registered function cannot be served
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Listener failed while serving
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Environment configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {var} must be a port number, got {value:?}")]
    InvalidPort { var: &'static str, value: String },
}

/// Errors found while turning registry entries into routes
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("function {symbol} should have a callback")]
    MissingCallback { symbol: String },

    #[error("function name {symbol:?} cannot be used as a route")]
    InvalidSymbol { symbol: String },

    #[error("function {symbol} is invalid: {source}")]
    Invalid {
        symbol: String,
        #[source]
        source: ValidationError,
    },
}

/// Errors reported by [`FunctionDescriptor::validate`](crate::FunctionDescriptor::validate)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{kind} functions must define a {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    #[error("Cloud Functions must have a callback")]
    MissingCallback,

    #[error("{0}")]
    Invalid(String),
}

/// Per-request failures of an event function
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Request body is larger than the configured limit
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Request body could not be read
    #[error("failed to read request body: {0}")]
    Body(String),

    /// Request body is not a valid event payload
    #[error("invalid event payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The callback returned an error; the message is sent back verbatim
    #[error("{0}")]
    Callback(String),
}

impl InvokeError {
    pub fn status(&self) -> StatusCode {
        match self {
            InvokeError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            InvokeError::Body(_) | InvokeError::Decode(_) => StatusCode::BAD_REQUEST,
            InvokeError::Callback(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for InvokeError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Admin API errors
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("failed to render backend manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_error_status_codes() {
        assert_eq!(
            InvokeError::Callback("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(
            InvokeError::from(decode).into_response().status(),
            StatusCode::BAD_REQUEST
        );

        assert_eq!(
            InvokeError::PayloadTooLarge { limit: 16 }
                .into_response()
                .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );

        assert_eq!(
            InvokeError::Body("connection reset".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_callback_error_message_is_verbatim() {
        let err = InvokeError::Callback("topic is gone".to_string());
        assert_eq!(err.to_string(), "topic is gone");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MissingField {
            kind: "Pub/Sub",
            field: "topic",
        };
        assert_eq!(err.to_string(), "Pub/Sub functions must define a topic");
        assert_eq!(
            ValidationError::MissingCallback.to_string(),
            "Cloud Functions must have a callback"
        );
    }
}
