//! Receiver errors.

use thiserror::Error;

/// Errors the file receiver can encounter.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The first datagram wasn't the literal `ftp`.
    #[error("handshake rejected: expected \"ftp\", got {0:?}")]
    BadHandshake(Vec<u8>),

    /// A socket operation failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A fragment arrived whose `(filename, total_frag)` doesn't match the
    /// transfer established by fragment 1. Treated as fatal; see the design
    /// note on this deviation from the original's permissiveness.
    #[error("fragment {frag_no} does not match the transfer established by fragment 1")]
    MismatchedHeader {
        /// The offending fragment number.
        frag_no: u32,
    },

    /// The output file could not be created (e.g. `./saved` doesn't exist).
    #[error("cannot create output file: {0}")]
    Fatal(String),
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, ReceiverError>;
