//! Fragmented file transfer receiver (FR): handshakes, reassembles
//! fragments in receive order, and simulates stochastic datagram loss.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod receiver;

pub use error::ReceiverError;
