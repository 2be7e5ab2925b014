//! Domain errors for the conferencing registries and auth check.

use thiserror::Error;

/// Errors raised by the sans-IO conferencing domain logic.
///
/// These are distinct from [`confer_proto::ProtocolError`]: protocol errors
/// describe malformed bytes, while `ConferenceError` describes a
/// structurally valid request that the domain state rejects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConferenceError {
    /// The client registry has no free slot for a new connection.
    #[error("server is full: {max} clients already connected")]
    ServerFull {
        /// Configured client capacity.
        max: usize,
    },

    /// `NEWSESS` named a session that already exists.
    #[error("session {0:?} already exists")]
    SessionAlreadyExists(String),

    /// `JOIN` or `SWITCHSESSION` named a session that does not exist.
    #[error("session {0:?} does not exist")]
    SessionNotFound(String),

    /// The session table is at capacity.
    #[error("server is full: {max} sessions already exist")]
    TooManySessions {
        /// Configured session capacity.
        max: usize,
    },

    /// A session already has `max` members.
    #[error("session {sid:?} is full ({max} members)")]
    SessionFull {
        /// Session that rejected the member.
        sid: String,
        /// Configured per-session member capacity.
        max: usize,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ConferenceError>;
