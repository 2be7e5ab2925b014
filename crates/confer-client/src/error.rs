//! Client-side errors.

use thiserror::Error;

/// Errors the interactive client can encounter.
#[derive(Debug, Error)]
pub enum ClientError {
    /// `/login` issued while already connected.
    #[error("already logged in")]
    AlreadyLoggedIn,

    /// A command that requires an active session was issued with none set.
    #[error("no active session; use /joinsession or /createsession first")]
    NoActiveSession,

    /// Malformed command line.
    #[error("bad command: {0}")]
    BadCommand(String),

    /// Transport-level failure: connect, send, or an unexpected close.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server rejected the login attempt.
    #[error("login rejected: {0}")]
    LoginRejected(String),
}

/// Convenience alias for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, ClientError>;
