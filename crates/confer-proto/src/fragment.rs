//! Fragment header for the file-transfer protocol.
//!
//! Unlike [`crate::frame::Frame`], the file-transfer wire format has no
//! fixed-size record: a fragment datagram is a textual header —
//! `"<total_frag>:<frag_no>:<data_size>:<filename>:"` — immediately followed
//! by `data_size` raw payload bytes, all in one UDP datagram.

use crate::errors::{ProtocolError, Result};

/// Maximum size of a complete fragment datagram (header + payload).
pub const MAX_DATAGRAM: usize = 2000;
/// Maximum size of the textual header prefix, scanned for its fourth `':'`.
pub const MAX_HEADER: usize = 511;
/// Maximum size of the payload portion of a single fragment.
pub const MAX_CHUNK: usize = 1000;
/// Maximum length of an embedded filename.
pub const MAX_FILENAME: usize = 255;

/// Parsed fragment header: `total_frag:frag_no:data_size:filename:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentHeader {
    /// Total number of fragments in the transfer.
    pub total_frag: u32,
    /// Zero-based index of this fragment.
    pub frag_no: u32,
    /// Byte length of the payload that follows this header.
    pub data_size: u32,
    /// Name of the file being transferred.
    pub filename: String,
}

impl FragmentHeader {
    /// Format this header as its wire-textual prefix, including the
    /// trailing `':'`.
    #[must_use]
    pub fn format(&self) -> String {
        format!("{}:{}:{}:{}:", self.total_frag, self.frag_no, self.data_size, self.filename)
    }

    /// Build a complete datagram: the formatted header followed by
    /// `payload` verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::FragmentSizeMismatch`] if `payload.len()`
    /// does not equal `self.data_size`, and propagates filename validation
    /// errors from [`validate_filename`].
    pub fn build_datagram(&self, payload: &[u8]) -> Result<Vec<u8>> {
        validate_filename(&self.filename)?;

        if payload.len() != self.data_size as usize {
            return Err(ProtocolError::FragmentSizeMismatch {
                claimed: self.data_size as usize,
                actual: payload.len(),
            });
        }

        let header = self.format();
        let mut datagram = Vec::with_capacity(header.len() + payload.len());
        datagram.extend_from_slice(header.as_bytes());
        datagram.extend_from_slice(payload);

        if datagram.len() > MAX_DATAGRAM {
            return Err(ProtocolError::FragmentSizeMismatch {
                claimed: MAX_DATAGRAM,
                actual: datagram.len(),
            });
        }

        Ok(datagram)
    }

    /// Parse a header off the front of a received datagram, returning the
    /// header and the remaining payload slice.
    ///
    /// Scans at most [`MAX_HEADER`] bytes for the fourth `':'` separator.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FragmentHeaderTooLong`] if no fourth separator is
    ///   found within the scan window.
    /// - [`ProtocolError::MalformedFragmentHeader`] if the header fields
    ///   cannot be parsed as the expected integers, or a filename fails
    ///   [`validate_filename`].
    /// - [`ProtocolError::FragmentSizeMismatch`] if the declared `data_size`
    ///   does not match the bytes actually remaining in `datagram`.
    pub fn parse(datagram: &[u8]) -> Result<(Self, &[u8])> {
        let scan_len = datagram.len().min(MAX_HEADER);
        let scan_window = &datagram[..scan_len];

        let mut separators = Vec::with_capacity(4);
        for (idx, &byte) in scan_window.iter().enumerate() {
            if byte == b':' {
                separators.push(idx);
                if separators.len() == 4 {
                    break;
                }
            }
        }

        if separators.len() < 4 {
            return Err(ProtocolError::FragmentHeaderTooLong { max: MAX_HEADER });
        }

        let text = std::str::from_utf8(&datagram[..separators[3]])
            .map_err(|e| ProtocolError::MalformedFragmentHeader(e.to_string()))?;
        let mut fields = text.splitn(4, ':');

        let total_frag = parse_field(fields.next(), "total_frag")?;
        let frag_no = parse_field(fields.next(), "frag_no")?;
        let data_size = parse_field(fields.next(), "data_size")?;
        let filename = fields
            .next()
            .ok_or_else(|| ProtocolError::MalformedFragmentHeader("missing filename".to_owned()))?
            .to_owned();

        validate_filename(&filename)?;

        let payload = &datagram[separators[3] + 1..];
        if payload.len() != data_size as usize {
            return Err(ProtocolError::FragmentSizeMismatch {
                claimed: data_size as usize,
                actual: payload.len(),
            });
        }

        Ok((Self { total_frag, frag_no, data_size, filename }, payload))
    }
}

fn parse_field(field: Option<&str>, name: &'static str) -> Result<u32> {
    field
        .ok_or_else(|| ProtocolError::MalformedFragmentHeader(format!("missing {name}")))?
        .parse::<u32>()
        .map_err(|e| ProtocolError::MalformedFragmentHeader(format!("{name}: {e}")))
}

/// Reject filenames containing `:`, `/`, a NUL byte, or longer than
/// [`MAX_FILENAME`] bytes.
///
/// # Errors
///
/// [`ProtocolError::InvalidFilename`] describing the violation.
pub fn validate_filename(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ProtocolError::InvalidFilename("filename is empty".to_owned()));
    }
    if name.len() > MAX_FILENAME {
        return Err(ProtocolError::InvalidFilename(format!(
            "filename exceeds {MAX_FILENAME} bytes"
        )));
    }
    if name.contains(':') || name.contains('/') || name.contains('\0') {
        return Err(ProtocolError::InvalidFilename(format!(
            "filename {name:?} contains a disallowed character"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn round_trip_simple() {
        let header = FragmentHeader {
            total_frag: 4,
            frag_no: 1,
            data_size: 3,
            filename: "report.txt".to_owned(),
        };
        let datagram = header.build_datagram(b"abc").expect("builds");

        let (parsed, payload) = FragmentHeader::parse(&datagram).expect("parses");
        assert_eq!(parsed, header);
        assert_eq!(payload, b"abc");
    }

    #[test]
    fn rejects_oversized_header_scan() {
        let long_name = "a".repeat(600);
        let datagram = format!("1:0:0:{long_name}:");
        let err = FragmentHeader::parse(datagram.as_bytes()).unwrap_err();
        assert_eq!(err, ProtocolError::FragmentHeaderTooLong { max: MAX_HEADER });
    }

    #[test]
    fn rejects_size_mismatch() {
        let datagram = b"1:0:10:file.txt:short";
        let err = FragmentHeader::parse(datagram).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::FragmentSizeMismatch { claimed: 10, actual: "short".len() }
        );
    }

    #[test]
    fn rejects_bad_filename_chars() {
        assert!(validate_filename("a/b").is_err());
        assert!(validate_filename("a:b").is_err());
        assert!(validate_filename("").is_err());
        assert!(validate_filename(&"x".repeat(300)).is_err());
        assert!(validate_filename("ok_name.bin").is_ok());
    }

    proptest! {
        #[test]
        fn round_trip_arbitrary_payload(
            total_frag in 1u32..1000,
            frag_no in 0u32..1000,
            filename in "[a-zA-Z0-9_.]{1,20}",
            payload in prop::collection::vec(any::<u8>(), 0..MAX_CHUNK),
        ) {
            let header = FragmentHeader {
                total_frag,
                frag_no,
                data_size: payload.len() as u32,
                filename,
            };
            let datagram = header.build_datagram(&payload).expect("builds");
            let (parsed, parsed_payload) = FragmentHeader::parse(&datagram).expect("parses");
            prop_assert_eq!(parsed, header);
            prop_assert_eq!(parsed_payload, payload.as_slice());
        }
    }
}
