//! Error taxonomy for the mock server
//!
//! - [`EncodingError`]: a single message could not be built. Fatal to that
//!   message only.
//! - [`ConnectionError`]: socket accept/write failure. Fatal to one session.
//! - [`ConfigurationError`]: bad startup configuration. Fatal to the process.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::fix::MessageKind;

/// Failure to build one FIX message
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{kind} is missing required tag {tag}")]
    MissingField { kind: MessageKind, tag: u32 },

    #[error("{kind} has tag {tag} more than once")]
    DuplicateField { kind: MessageKind, tag: u32 },

    #[error("tag {tag} is not part of {kind}")]
    UnexpectedField { kind: MessageKind, tag: u32 },

    #[error("tag {tag} has an invalid value {value:?}")]
    InvalidValue { tag: u32, value: String },

    #[error("executed quantity ({executed}) exceeds order quantity ({ordered})")]
    InvalidQuantity { ordered: u64, executed: u64 },
}

/// Socket-level failure, contained to one session or one accept
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),
}

/// Invalid startup configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid listen address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("{field} must not be zero or empty")]
    ZeroValue { field: &'static str },

    #[error("{field} must be non-empty and free of '|' and newlines (got {value:?})")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error(transparent)]
    Listener(#[from] ConnectionError),
}
