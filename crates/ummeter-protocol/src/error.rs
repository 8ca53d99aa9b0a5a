//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when decoding a data dump.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is too short to be valid.
    #[error("frame too short: expected {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Frame is too long.
    #[error("frame too long: maximum {max} bytes, got {actual}")]
    FrameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        actual: usize,
    },
}

/// Errors raised while encoding a command, before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Command parameter outside of its documented range.
    #[error("{parameter} out of range: {value} not in {min}..={max}")]
    OutOfRange {
        /// Parameter name.
        parameter: &'static str,
        /// Rejected value.
        value: i32,
        /// Smallest accepted value.
        min: i32,
        /// Largest accepted value.
        max: i32,
    },
}
