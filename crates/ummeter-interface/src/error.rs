//! Error types for meter interfaces.

use std::io;

use thiserror::Error;

/// Errors raised by a meter interface. All of them mean the byte channel
/// is unusable for the requested operation.
#[derive(Debug, Error)]
pub enum InterfaceError {
    /// Operation requires an open interface.
    #[error("{kind} interface is not open")]
    NotOpen { kind: &'static str },

    /// The channel could not be established.
    #[error("could not open {kind} interface {target}")]
    Open {
        kind: &'static str,
        target: String,
        #[source]
        source: io::Error,
    },

    /// Read, write or configuration failure on an open channel.
    #[error("I/O error on {kind} interface")]
    Io {
        kind: &'static str,
        #[source]
        source: io::Error,
    },

    /// Empty or otherwise unusable device path.
    #[error("invalid device path: {0:?}")]
    InvalidPath(String),

    /// Malformed Bluetooth device address.
    #[error("invalid Bluetooth address: {0:?}")]
    InvalidAddress(String),

    /// Transport not available on this platform.
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

/// Result type alias for interface operations.
pub type InterfaceResult<T> = Result<T, InterfaceError>;
