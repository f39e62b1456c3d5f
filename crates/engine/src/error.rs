//! Engine client error types.
//!
//! [`EngineClientError`] converts into [`ScoutpostError`] so callers can
//! propagate it with `?`.

use scoutpost_core::error::{EngineError, ScoutpostError};

/// Errors raised by the container engine client.
#[derive(Debug, thiserror::Error)]
pub enum EngineClientError {
    /// The engine daemon could not be reached.
    #[error("engine connection error: {0}")]
    Connection(String),

    /// Engine API call failed.
    #[error("engine api error: {0}")]
    Api(String),

    /// Container, image, network or volume does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rejected container identifier (ID or name).
    #[error("invalid container identifier '{id}': {reason}")]
    InvalidIdentifier {
        /// The rejected identifier
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// Rejected container creation request.
    #[error("invalid container spec: {field}: {reason}")]
    InvalidSpec {
        /// Offending field
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// Invalid client configuration.
    #[error("config error: {field}: {reason}")]
    Config {
        /// Configuration field name
        field: String,
        /// Why it was rejected
        reason: String,
    },
}

impl From<EngineClientError> for ScoutpostError {
    fn from(err: EngineClientError) -> Self {
        match err {
            EngineClientError::Connection(msg) => {
                ScoutpostError::Engine(EngineError::Connection(msg))
            }
            EngineClientError::NotFound(what) => ScoutpostError::Engine(EngineError::NotFound(what)),
            EngineClientError::Api(msg) => ScoutpostError::Engine(EngineError::Operation(msg)),
            other @ (EngineClientError::InvalidIdentifier { .. }
            | EngineClientError::InvalidSpec { .. }
            | EngineClientError::Config { .. }) => {
                ScoutpostError::Engine(EngineError::Operation(other.to_string()))
            }
        }
    }
}
