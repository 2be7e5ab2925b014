//! Fragmentation and the stop-and-wait transfer loop (FS).

use std::time::Duration;

use confer_proto::{FragmentHeader, MAX_CHUNK};
use tokio::net::UdpSocket;

use crate::error::{Result, SenderError};

/// Fatal if unacknowledged after this many transmissions of one fragment.
const MAX_ATTEMPTS: u32 = 5;
/// Initial per-fragment ACK timeout; doubles on each retry up to 8s.
const INITIAL_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_TIMEOUT: Duration = Duration::from_secs(8);

/// Perform the handshake (`"ftp"` / `"yes"`) on an already-connected socket.
pub async fn handshake(socket: &UdpSocket) -> Result<()> {
    socket.send(b"ftp").await.map_err(|e| SenderError::Transport(e.to_string()))?;

    let mut buf = [0u8; 3];
    let n = socket.recv(&mut buf).await.map_err(|e| SenderError::Transport(e.to_string()))?;
    if &buf[..n] != b"yes" {
        return Err(SenderError::HandshakeRejected { reply: buf[..n].to_vec() });
    }
    Ok(())
}

/// Fragment `data` and transmit it over `socket`, retrying each fragment
/// with exponential backoff until ACKed or the attempt budget is exhausted.
pub async fn send_file(socket: &UdpSocket, filename: &str, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(SenderError::EmptyFile);
    }

    let total_frag = u32::try_from(data.len().div_ceil(MAX_CHUNK))
        .expect("file sizes exercised by this protocol fit comfortably in u32 fragment counts");

    for frag_no in 1..=total_frag {
        let start = (frag_no as usize - 1) * MAX_CHUNK;
        let end = (start + MAX_CHUNK).min(data.len());
        let chunk = &data[start..end];

        let header = FragmentHeader {
            total_frag,
            frag_no,
            data_size: u32::try_from(chunk.len()).expect("chunk is at most MAX_CHUNK bytes"),
            filename: filename.to_owned(),
        };
        let datagram = header.build_datagram(chunk)?;

        send_fragment_with_retry(socket, &datagram, frag_no).await?;
        tracing::info!(frag_no, total_frag, "fragment acknowledged");
    }

    Ok(())
}

async fn send_fragment_with_retry(socket: &UdpSocket, datagram: &[u8], frag_no: u32) -> Result<()> {
    let mut timeout = INITIAL_TIMEOUT;

    for attempt in 1..=MAX_ATTEMPTS {
        socket.send(datagram).await.map_err(|e| SenderError::Transport(e.to_string()))?;

        let mut buf = [0u8; 3];
        let acked = matches!(
            tokio::time::timeout(timeout, socket.recv(&mut buf)).await,
            Ok(Ok(3)) if &buf == b"ACK"
        );
        if acked {
            return Ok(());
        }

        tracing::warn!(frag_no, attempt, ?timeout, "fragment not acknowledged, retrying");
        timeout = (timeout * 2).min(MAX_TIMEOUT);
    }

    Err(SenderError::Exhausted { frag_no, attempts: MAX_ATTEMPTS })
}
