//! Sans-IO domain logic for the conferencing service.
//!
//! Nothing in this crate touches a socket or the wall clock directly: time
//! comes through [`Environment`], transport through a generic handle type
//! threaded through [`client_registry::ClientRegistry`]. This makes the
//! registries, authenticator, and dispatch logic in [`state`] unit-testable
//! without spinning up any IO.

pub mod auth;
pub mod client_registry;
pub mod env;
pub mod error;
pub mod limits;
pub mod session_registry;
pub mod state;

pub use client_registry::{ClientRecord, ClientRegistry};
pub use env::Environment;
pub use error::{ConferenceError, Result};
pub use limits::{MAX_CLIENTS, MAX_SESSIONS};
pub use session_registry::{Session, SessionRegistry};
pub use state::{JoinOutcome, LoginOutcome, NewSessionOutcome, ServerState};
