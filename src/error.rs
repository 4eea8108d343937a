//! Error types for the telemetry link.
//!
//! This module provides error handling for the groundlink ingestion pipeline.
//! All errors implement the `std::error::Error` trait and carry structured
//! context for diagnostics.
//!
//! ## Error Categories
//!
//! - **Open Errors**: The serial link could not be opened; fatal for the session
//! - **Read Errors**: I/O failure mid-session; fatal, ends the read loop
//! - **Config Errors**: Invalid or unreadable port configuration
//! - **Decode Errors**: Malformed frame payloads; recoverable, the frame is skipped
//!
//! ## Fatal vs. Recoverable
//!
//! ```rust
//! use groundlink::{DecodeError, LinkError};
//!
//! let error = LinkError::open_failed("/dev/ttyUSB0", "no such device");
//! assert!(error.is_fatal());
//!
//! let error = LinkError::from(DecodeError::FieldCount { got: 7 });
//! assert!(!error.is_fatal());
//! ```

use thiserror::Error;

/// Result type alias for link operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for the serial telemetry link.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    #[error("failed to open serial port {port}: {reason}")]
    Open {
        port: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("serial read failed: {reason}")]
    Read {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid port configuration: {reason}")]
    Config { reason: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Recoverable per-frame decoding failures.
///
/// A `DecodeError` never stops the pipeline: the matched span is consumed
/// from the decode buffer and the error is surfaced to the sink as a
/// diagnostic event.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("telemetry frame has {got} usable fields, expected 8")]
    FieldCount { got: usize },

    #[error("non-numeric telemetry field {index}: {token:?}")]
    NonNumeric { index: usize, token: String },

    #[error("chunk contained {replaced} invalid UTF-8 sequence(s), bytes sanitized")]
    InvalidEncoding { replaced: usize },

    #[error("decode buffer overflowed, dropped {dropped} oldest bytes")]
    BufferOverflow { dropped: usize },

    #[error("orphan end marker {marker} discarded, its frame never started")]
    OrphanEndMarker { marker: &'static str },
}

impl LinkError {
    /// Returns whether this error ends the link session.
    ///
    /// Fatal errors surface as terminal lifecycle events; recoverable ones
    /// as diagnostics, after which processing continues.
    pub fn is_fatal(&self) -> bool {
        match self {
            LinkError::Open { .. } => true,
            LinkError::Read { .. } => true,
            LinkError::Config { .. } => true,
            LinkError::Decode(_) => false,
        }
    }

    /// Helper constructor for open failures.
    pub fn open_failed(port: impl Into<String>, reason: impl Into<String>) -> Self {
        LinkError::Open { port: port.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for open failures with an underlying cause.
    pub fn open_failed_with_source(
        port: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LinkError::Open { port: port.into(), reason: source.to_string(), source: Some(source) }
    }

    /// Helper constructor for read failures.
    pub fn read_failed(reason: impl Into<String>) -> Self {
        LinkError::Read { reason: reason.into(), source: None }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        LinkError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Read { reason: err.to_string(), source: Some(Box::new(err)) }
    }
}
