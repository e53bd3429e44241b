//! Error taxonomy for the dispatch core.
//!
//! # Design Decisions
//! - Startup errors (`ConfigurationError`, `ListenError`) are fatal or
//!   recovered at bind time; they never reach the request path
//! - `HandlerError` is the only error a request handler returns; the server
//!   renders it as the fixed 500 page and keeps serving
//! - `ProtocolError` is logged and dropped; the HMR socket stays open

use axum::http::Method;
use thiserror::Error;

/// Misuse of route/pipeline registration. Fatal at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("pipeline group '{0}' is not registered")]
    UnknownGroup(String),

    #[error("unknown pipe '{0}'")]
    UnknownPipe(String),

    #[error("unknown controller '{0}'")]
    UnknownController(String),

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
}

/// Failure to bring up the listening socket.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("no free port between {first} and {last}")]
    Exhausted { first: u16, last: u16 },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that goes wrong while producing a response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("no action '{action}' on controller '{controller}' for {method}")]
    UnknownAction {
        controller: String,
        action: String,
        method: Method,
    },

    #[error("{0}")]
    Project(String),

    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),

    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),
}

impl HandlerError {
    /// Static label for metrics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Configuration(_) => "configuration",
            Self::UnknownAction { .. } => "unknown_action",
            Self::Project(_) => "project",
            Self::Response(_) => "response",
            Self::Body(_) => "body",
        }
    }
}

/// A client frame on the HMR channel that could not be understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("hotAccept without a module id")]
    EmptyModuleId,

    #[error("binary frames are not part of the protocol")]
    Binary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_message_passthrough() {
        let err = HandlerError::Project("page renderer crashed".into());
        assert_eq!(err.to_string(), "page renderer crashed");
        assert_eq!(err.error_code(), "project");

        let err: HandlerError = ConfigurationError::UnknownGroup("admin".into()).into();
        assert_eq!(err.to_string(), "pipeline group 'admin' is not registered");
    }
}
