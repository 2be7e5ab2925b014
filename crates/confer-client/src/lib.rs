//! Interactive conferencing client.
//!
//! Connects to a `confer-server` over TCP, performs the LOGIN handshake, and
//! turns REPL commands into frames. See [`app::Command`] for the command
//! grammar and [`transport::login`] for the handshake. Reading the socket and
//! reading stdin happen concurrently: [`transport::login`] spawns a
//! reader/writer task pair (the same split used on the server side) so
//! broadcast traffic can arrive while the user is mid-keystroke.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod error;
pub mod transport;

pub use error::ClientError;
