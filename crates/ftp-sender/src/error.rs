//! Sender errors.

use thiserror::Error;

/// Errors the file sender can encounter.
#[derive(Debug, Error)]
pub enum SenderError {
    /// The stdin line wasn't of the form `ftp <filename>`.
    #[error("usage: ftp <filename>")]
    BadStdinLine,

    /// The named file could not be read.
    #[error("cannot read {path}: {source}")]
    FileUnreadable {
        /// Path that failed to open.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// Empty files are rejected rather than sent as a zero-fragment transfer.
    #[error("refusing to send an empty file")]
    EmptyFile,

    /// A socket operation failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The handshake reply wasn't the literal `yes`.
    #[error("handshake rejected: server replied {reply:?}")]
    HandshakeRejected {
        /// The bytes the server actually sent.
        reply: Vec<u8>,
    },

    /// A fragment went unacknowledged through every retry.
    #[error("fragment {frag_no} was not acknowledged after {attempts} attempts")]
    Exhausted {
        /// The fragment that was never ACKed.
        frag_no: u32,
        /// Total attempts made, including the first.
        attempts: u32,
    },

    /// Building the fragment's wire header failed (e.g. bad filename).
    #[error(transparent)]
    Protocol(#[from] confer_proto::ProtocolError),
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, SenderError>;
