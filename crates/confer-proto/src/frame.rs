//! Fixed-size conferencing frame.
//!
//! A `Frame` is the entire message for the conferencing protocol: a 1132-byte
//! record carrying a type tag, an advisory payload-size field, a zero-padded
//! source principal, a zero-padded session name, and a zero-padded 1024-byte
//! data payload. There is no separate header/payload split on the wire — the
//! whole record is read and written as one indivisible unit.
//!
//! Multi-byte integers are little-endian. This is a documented deviation:
//! nothing in this protocol requires network byte order, and both peers are
//! built from this same crate, so the simpler in-memory order is used
//! end-to-end.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// Byte length of the `source` field.
pub const SOURCE_LEN: usize = 50;
/// Byte length of the `session` field.
pub const SESSION_LEN: usize = 50;
/// Byte length of the `data` field.
pub const DATA_LEN: usize = 1024;
/// Total wire size of a [`Frame`] (8 + 50 + 50 + 1024).
pub const FRAME_SIZE: usize = 8 + SOURCE_LEN + SESSION_LEN + DATA_LEN;

/// Closed enumeration of conferencing message types, numbered 1..13.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client -> server: present credentials.
    Login = 1,
    /// Server -> client: login accepted.
    LoAck = 2,
    /// Server -> client: login rejected.
    LoNak = 3,
    /// Client -> server: graceful disconnect.
    Exit = 4,
    /// Client -> server: join a named session.
    Join = 5,
    /// Server -> client: join accepted.
    JnAck = 6,
    /// Server -> client: join rejected.
    JnNak = 7,
    /// Client -> server: leave a named session.
    LeaveSess = 8,
    /// Client -> server: create a named session.
    NewSess = 9,
    /// Server -> client: session created.
    NsAck = 10,
    /// Client -> server or server -> client: broadcast payload.
    Message = 11,
    /// Client -> server: request a listing of users/sessions.
    Query = 12,
    /// Server -> client: listing reply.
    QuAck = 13,
}

impl MessageType {
    /// Raw wire value.
    #[must_use]
    pub fn to_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for MessageType {
    type Error = ProtocolError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::Login),
            2 => Ok(Self::LoAck),
            3 => Ok(Self::LoNak),
            4 => Ok(Self::Exit),
            5 => Ok(Self::Join),
            6 => Ok(Self::JnAck),
            7 => Ok(Self::JnNak),
            8 => Ok(Self::LeaveSess),
            9 => Ok(Self::NewSess),
            10 => Ok(Self::NsAck),
            11 => Ok(Self::Message),
            12 => Ok(Self::Query),
            13 => Ok(Self::QuAck),
            other => Err(ProtocolError::UnknownMessageType(other)),
        }
    }
}

/// The fixed 1132-byte conferencing frame.
///
/// # Invariants
///
/// - Wire size is always exactly [`FRAME_SIZE`] bytes; there is no variable
///   trailer, unlike a header+payload split.
/// - `source`/`session`/`data` are zero-padded byte arrays; textual content
///   is NUL-terminated within the field and must not itself contain a NUL
///   byte before its logical end.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Frame {
    msg_type: [u8; 4],
    size: [u8; 4],
    source: [u8; SOURCE_LEN],
    session: [u8; SESSION_LEN],
    data: [u8; DATA_LEN],
}

impl Frame {
    /// Build a new, otherwise-empty frame of the given type.
    #[must_use]
    pub fn new(msg_type: MessageType) -> Self {
        Self {
            msg_type: msg_type.to_u32().to_le_bytes(),
            size: [0; 4],
            source: [0; SOURCE_LEN],
            session: [0; SESSION_LEN],
            data: [0; DATA_LEN],
        }
    }

    /// Raw `type` field.
    #[must_use]
    pub fn msg_type(&self) -> u32 {
        u32::from_le_bytes(self.msg_type)
    }

    /// `type` field as the closed enum, if recognized.
    pub fn msg_type_enum(&self) -> Result<MessageType> {
        MessageType::try_from(self.msg_type())
    }

    /// Advisory payload length. Never consulted to decide how many bytes to
    /// read off the wire — the frame is always read as a fixed extent.
    #[must_use]
    pub fn size(&self) -> u32 {
        u32::from_le_bytes(self.size)
    }

    /// `source` field, trimmed at the first NUL byte, as UTF-8 (lossy).
    #[must_use]
    pub fn source_str(&self) -> String {
        field_to_string(&self.source)
    }

    /// `session` field, trimmed at the first NUL byte, as UTF-8 (lossy).
    #[must_use]
    pub fn session_str(&self) -> String {
        field_to_string(&self.session)
    }

    /// Full `data` field, zero padding included.
    #[must_use]
    pub fn data_bytes(&self) -> &[u8; DATA_LEN] {
        &self.data
    }

    /// `data` field trimmed at the first NUL byte, as UTF-8 (lossy).
    #[must_use]
    pub fn data_str(&self) -> String {
        field_to_string(&self.data)
    }

    /// Set the `source` field, zero-padding or truncating to fit.
    pub fn set_source(&mut self, value: &str) {
        write_field(&mut self.source, value.as_bytes());
    }

    /// Set the `session` field, zero-padding or truncating to fit.
    pub fn set_session(&mut self, value: &str) {
        write_field(&mut self.session, value.as_bytes());
    }

    /// Set the `data` field from a UTF-8 string, zero-padding or truncating.
    /// Also updates the advisory `size` field to the written byte length.
    pub fn set_data_str(&mut self, value: &str) {
        self.set_data_bytes(value.as_bytes());
    }

    /// Set the `data` field from raw bytes, zero-padding or truncating.
    /// Also updates the advisory `size` field to the written byte length.
    pub fn set_data_bytes(&mut self, value: &[u8]) {
        write_field(&mut self.data, value);
        #[allow(clippy::cast_possible_truncation)]
        let written = value.len().min(DATA_LEN) as u32;
        self.size = written.to_le_bytes();
    }

    /// Encode into the fixed wire representation.
    #[must_use]
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; FRAME_SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Decode a frame from exactly [`FRAME_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTooShort`] / [`ProtocolError::FrameTooLong`]
    ///   if `bytes.len() != FRAME_SIZE`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FRAME_SIZE {
            return Err(ProtocolError::FrameTooShort { expected: FRAME_SIZE, actual: bytes.len() });
        }
        if bytes.len() > FRAME_SIZE {
            return Err(ProtocolError::FrameTooLong { expected: FRAME_SIZE, actual: bytes.len() });
        }

        #[allow(clippy::expect_used)]
        let frame = Self::ref_from_bytes(bytes)
            .expect("invariant: length checked above matches FRAME_SIZE exactly");

        Ok(*frame)
    }
}

// Manual Debug (packed repr prevents derive).
impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("msg_type", &self.msg_type())
            .field("size", &self.size())
            .field("source", &self.source_str())
            .field("session", &self.session_str())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.encode() == other.encode()
    }
}

impl Eq for Frame {}

fn field_to_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn write_field(field: &mut [u8], value: &[u8]) {
    field.fill(0);
    let n = value.len().min(field.len());
    field[..n].copy_from_slice(&value[..n]);
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn frame_size_matches_spec() {
        assert_eq!(FRAME_SIZE, 1132);
        assert_eq!(std::mem::size_of::<Frame>(), FRAME_SIZE);
    }

    #[test]
    fn round_trip_login() {
        let mut frame = Frame::new(MessageType::Login);
        frame.set_source("alice");
        frame.set_data_str("hunter2");

        let wire = frame.encode();
        let parsed = Frame::decode(&wire).expect("should decode");

        assert_eq!(parsed.msg_type_enum().unwrap(), MessageType::Login);
        assert_eq!(parsed.source_str(), "alice");
        assert_eq!(parsed.data_str(), "hunter2");
    }

    #[test]
    fn reject_short_buffer() {
        let buf = [0u8; 100];
        assert_eq!(
            Frame::decode(&buf),
            Err(ProtocolError::FrameTooShort { expected: FRAME_SIZE, actual: 100 })
        );
    }

    #[test]
    fn reject_long_buffer() {
        let buf = vec![0u8; FRAME_SIZE + 1];
        assert_eq!(
            Frame::decode(&buf),
            Err(ProtocolError::FrameTooLong { expected: FRAME_SIZE, actual: FRAME_SIZE + 1 })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut buf = [0u8; FRAME_SIZE];
        buf[0..4].copy_from_slice(&99u32.to_le_bytes());
        let frame = Frame::decode(&buf).expect("structurally valid");
        assert_eq!(frame.msg_type_enum(), Err(ProtocolError::UnknownMessageType(99)));
    }

    #[test]
    fn data_field_truncates_and_reports_size() {
        let mut frame = Frame::new(MessageType::Message);
        let long = "x".repeat(DATA_LEN + 10);
        frame.set_data_str(&long);
        assert_eq!(frame.size() as usize, DATA_LEN);
        assert_eq!(frame.data_str().len(), DATA_LEN);
    }

    proptest! {
        #[test]
        fn source_and_session_round_trip(
            source in "[a-zA-Z0-9_]{1,49}",
            session in "[a-zA-Z0-9_]{1,49}",
        ) {
            let mut frame = Frame::new(MessageType::Join);
            frame.set_source(&source);
            frame.set_session(&session);

            let wire = frame.encode();
            let parsed = Frame::decode(&wire).expect("should decode");

            prop_assert_eq!(parsed.source_str(), source);
            prop_assert_eq!(parsed.session_str(), session);
        }
    }
}
