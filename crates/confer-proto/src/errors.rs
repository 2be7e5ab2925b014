//! Error types shared by both wire codecs in this crate.

use thiserror::Error;

/// Errors produced while decoding either wire format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Conferencing frame buffer was shorter than the fixed frame size.
    #[error("frame too short: expected {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Required size.
        expected: usize,
        /// Size actually supplied.
        actual: usize,
    },

    /// Conferencing frame buffer was longer than the fixed frame size.
    #[error("frame too long: expected {expected} bytes, got {actual}")]
    FrameTooLong {
        /// Required size.
        expected: usize,
        /// Size actually supplied.
        actual: usize,
    },

    /// The `type` field did not match any opcode in the closed enumeration.
    #[error("unknown message type: {0}")]
    UnknownMessageType(u32),

    /// Fragment header did not contain four `':'` separators within the
    /// scan window, or fewer bytes than a complete header requires.
    #[error("fragment header malformed: {0}")]
    MalformedFragmentHeader(String),

    /// Fragment header exceeded the 511-byte scan limit before a fourth
    /// `':'` was found.
    #[error("fragment header exceeds {max}-byte limit")]
    FragmentHeaderTooLong {
        /// The limit that was exceeded.
        max: usize,
    },

    /// Filename embedded in a fragment header failed validation (contains
    /// `:`, `/`, NUL, or exceeds 255 bytes).
    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    /// Declared `data_size` did not match the bytes actually present in the
    /// datagram after the header.
    #[error("fragment data size mismatch: header claims {claimed}, datagram has {actual}")]
    FragmentSizeMismatch {
        /// Size claimed by the header.
        claimed: usize,
        /// Size actually available.
        actual: usize,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
