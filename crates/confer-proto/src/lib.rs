//! Wire formats shared by the conferencing and file-transfer systems.
//!
//! This crate is sans-IO: it defines how bytes are laid out and validated,
//! and never touches a socket. [`frame`] covers the fixed-size conferencing
//! frame; [`fragment`] covers the textual-header file-transfer datagram.

pub mod errors;
pub mod fragment;
pub mod frame;

pub use errors::{ProtocolError, Result};
pub use fragment::{FragmentHeader, MAX_CHUNK, MAX_DATAGRAM, MAX_FILENAME, MAX_HEADER};
pub use frame::{DATA_LEN, FRAME_SIZE, Frame, MessageType, SESSION_LEN, SOURCE_LEN};
