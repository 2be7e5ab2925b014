//! Wire codec (C), IO-bound half: read and write a [`Frame`] as the fixed
//! 1132-byte extent over a `TcpStream`. `read_exact`/`write_all` already loop
//! internally over partial I/O, satisfying §4.1's framing contract; any
//! short read, short write, or I/O error surfaces as `None`/`Err` and the
//! caller treats the connection as closed.

use confer_proto::{FRAME_SIZE, Frame};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read exactly one frame, or `None` if the connection closed or the bytes
/// did not decode to a valid frame.
pub async fn recv_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Option<Frame> {
    let mut buf = [0u8; FRAME_SIZE];
    reader.read_exact(&mut buf).await.ok()?;
    Frame::decode(&buf).ok()
}

/// Write exactly one frame. An `Err` means the connection should be treated
/// as closed.
pub async fn send_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> std::io::Result<()> {
    writer.write_all(&frame.encode()).await
}
