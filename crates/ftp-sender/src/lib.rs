//! Fragmented file transfer sender (FS): reads a local file, fragments it,
//! and transmits it over UDP with a per-fragment stop-and-wait ACK.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod sender;

pub use error::SenderError;
