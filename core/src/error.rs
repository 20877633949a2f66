//! Error types for the ATOL web-service client.
//!
//! # Design
//! Three domain classes — `Init`, `Request`, `Document` — mirror the failure
//! taxonomy of the device protocol: unreachable at construction, rejected
//! submission, invalid document input. `Serialization`/`Deserialization`
//! cover JSON mapping, `Transport` wraps I/O failures outside the initial
//! ping. Every variant is fatal to the calling operation; nothing retries
//! automatically.

use std::fmt;

use crate::http::TransportError;

/// Errors returned by `AtolClient` operations.
#[derive(Debug)]
pub enum AtolError {
    /// The web server did not answer the health check at construction.
    Init(String),

    /// The server returned an unexpected status for a submit or poll.
    Request { status: u16, body: String },

    /// The fiscal document input is invalid: unknown document type or an
    /// item missing required fields. The message names every offender.
    Document(String),

    /// The request payload could not be serialized to JSON.
    Serialization(String),

    /// The response body could not be deserialized into the expected shape.
    Deserialization(String),

    /// The transport failed to execute the request at all.
    Transport(String),
}

impl fmt::Display for AtolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtolError::Init(msg) => write!(f, "could not connect to ATOL web server: {msg}"),
            AtolError::Request { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            AtolError::Document(msg) => write!(f, "invalid fiscal document: {msg}"),
            AtolError::Serialization(msg) => write!(f, "serialization failed: {msg}"),
            AtolError::Deserialization(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
            AtolError::Transport(msg) => write!(f, "transport failed: {msg}"),
        }
    }
}

impl std::error::Error for AtolError {}

impl From<TransportError> for AtolError {
    fn from(err: TransportError) -> Self {
        AtolError::Transport(err.0)
    }
}
