//! Typed error hierarchy for the inquiry board.
//!
//! - `SourceError`: data-source failures (in-memory store, HTTP client)
//! - `EngineError`: rejected drag-gesture inputs on the board engine
//! - `ConfigError`: unusable environment overrides

use thiserror::Error;

/// Errors from a `DataSource` operation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("Inquiry not found")]
    NotFound { id: String },

    #[error("Invalid phase")]
    InvalidPhase { phase: String },

    #[error("{0}")]
    BadRequest(String),

    /// Non-success response from a remote board API.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. }) || matches!(self, Self::Http { status: 404, .. })
    }
}

/// Inputs the board engine refuses to apply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Inquiry {id} is not on the board")]
    UnknownInquiry { id: String },

    #[error("Inquiry {id} is still saving")]
    AlreadySaving { id: String },

    #[error("A drag is already in progress for inquiry {id}")]
    DragInProgress { id: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}
