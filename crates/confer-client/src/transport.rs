//! TCP transport: the LOGIN handshake plus the reader/writer task split
//! used on the server side (see `confer_server::handler::run_connection`).
//! The handshake itself runs inline before either task is spawned, since its
//! reply must be observed before any broadcast traffic can arrive.

use std::net::SocketAddr;

use confer_proto::{FRAME_SIZE, Frame, MessageType};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
};

use crate::error::{ClientError, Result};

async fn recv_frame(reader: &mut OwnedReadHalf) -> Option<Frame> {
    let mut buf = [0u8; FRAME_SIZE];
    reader.read_exact(&mut buf).await.ok()?;
    Frame::decode(&buf).ok()
}

async fn send_frame(writer: &mut OwnedWriteHalf, frame: &Frame) -> std::io::Result<()> {
    writer.write_all(&frame.encode()).await
}

/// A logged-in connection: an outbound queue the writer task drains, and an
/// inbound stream of frames the reader task forwards (replies to our own
/// commands, plus broadcast messages from other clients).
pub struct Connection {
    /// Send a frame to the server.
    pub outbound: mpsc::UnboundedSender<Frame>,
    /// Frames the server has sent us, in receive order.
    pub inbound: mpsc::UnboundedReceiver<Frame>,
}

impl Connection {
    /// Queue a frame for the writer task.
    pub fn send(&self, frame: Frame) -> Result<()> {
        self.outbound.send(frame).map_err(|_| ClientError::Transport("connection closed".to_owned()))
    }
}

async fn run_writer(mut write_half: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Frame>) {
    while let Some(frame) = rx.recv().await {
        if send_frame(&mut write_half, &frame).await.is_err() {
            break;
        }
    }
}

async fn run_reader(mut read_half: OwnedReadHalf, tx: mpsc::UnboundedSender<Frame>) {
    while let Some(frame) = recv_frame(&mut read_half).await {
        if tx.send(frame).is_err() {
            break;
        }
    }
}

/// Connect to `addr`, perform the LOGIN handshake, and spawn the reader and
/// writer tasks once it succeeds.
pub async fn login(addr: SocketAddr, id: &str, password: &str) -> Result<Connection> {
    let stream = TcpStream::connect(addr).await.map_err(|e| ClientError::Transport(e.to_string()))?;
    let (mut read_half, mut write_half) = stream.into_split();

    let mut login_frame = Frame::new(MessageType::Login);
    login_frame.set_source(id);
    login_frame.set_data_str(password);
    send_frame(&mut write_half, &login_frame).await.map_err(|e| ClientError::Transport(e.to_string()))?;

    let reply = recv_frame(&mut read_half)
        .await
        .ok_or_else(|| ClientError::Transport("connection closed during login".to_owned()))?;

    match reply.msg_type_enum() {
        Ok(MessageType::LoAck) => {},
        Ok(MessageType::LoNak) => return Err(ClientError::LoginRejected(reply.data_str())),
        _ => return Err(ClientError::Transport("unexpected reply to LOGIN".to_owned())),
    }

    let (out_tx, out_rx) = mpsc::unbounded_channel::<Frame>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<Frame>();

    tokio::spawn(run_writer(write_half, out_rx));
    tokio::spawn(run_reader(read_half, in_tx));

    Ok(Connection { outbound: out_tx, inbound: in_rx })
}
