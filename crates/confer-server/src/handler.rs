//! Connection handler (H): per-client connection lifecycle.
//!
//! Each connection gets two tasks: this one (the reader) owns the read half
//! of the socket and performs the login handshake and dispatch loop; a
//! second, short writer task (spawned here, see [`run_writer`]) owns the
//! write half and drains an outbound queue. Splitting this way means a
//! broadcast from another client's handler — or a forced close from the
//! idle reaper — never needs a second borrow of this connection's socket;
//! it just pushes onto the queue or fires the close notification.

use std::{net::SocketAddr, sync::Arc};

use confer_core::{Environment, JoinOutcome, NewSessionOutcome, ServerState};
use confer_proto::{Frame, MessageType};
use tokio::{
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::{Notify, mpsc},
};

use crate::{
    ClientHandle, SharedState,
    codec::{recv_frame, send_frame},
};

fn text_reply(msg_type: MessageType, text: &str) -> Frame {
    let mut frame = Frame::new(msg_type);
    frame.set_data_str(text);
    frame
}

async fn run_writer(mut write_half: OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Frame>) {
    while let Some(frame) = rx.recv().await {
        if send_frame(&mut write_half, &frame).await.is_err() {
            break;
        }
    }
}

/// Run one client connection to completion: handshake, dispatch loop, then
/// cleanup. Returns once the connection is closed by either side.
pub async fn run_connection<E: Environment>(stream: TcpStream, addr: SocketAddr, state: SharedState<E>, env: E) {
    let (mut read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel::<Frame>();
    let writer = tokio::spawn(run_writer(write_half, rx));

    let Some(first) = recv_frame(&mut read_half).await else {
        drop(tx);
        let _ = writer.await;
        return;
    };

    if first.msg_type_enum() != Ok(MessageType::Login) {
        let _ = tx.send(text_reply(MessageType::LoNak, "expected LOGIN"));
        drop(tx);
        let _ = writer.await;
        return;
    }

    let id = first.source_str();
    let password = first.data_str();
    let close = Arc::new(Notify::new());
    let handle = ClientHandle { outbound: tx.clone(), close: Arc::clone(&close) };

    let slot = {
        let now = env.now();
        let mut guard = state.lock().await;
        match guard.login(handle, &id, &password, addr, now) {
            confer_core::LoginOutcome::Accepted { slot } => {
                let _ = tx.send(text_reply(MessageType::LoAck, "Login successful"));
                slot
            },
            confer_core::LoginOutcome::Rejected { reason } => {
                drop(guard);
                let _ = tx.send(text_reply(MessageType::LoNak, &reason));
                drop(tx);
                let _ = writer.await;
                return;
            },
        }
    };

    tracing::info!(client = %id, %addr, "client logged in");

    loop {
        tokio::select! {
            biased;

            _ = close.notified() => {
                tracing::info!(client = %id, %addr, "connection forcibly closed");
                break;
            }

            incoming = recv_frame(&mut read_half) => {
                let Some(frame) = incoming else { break };

                let now = env.now();
                let mut guard = state.lock().await;
                guard.clients_mut().touch(slot, now);

                if !dispatch(&mut guard, slot, &id, frame) {
                    break;
                }
            }
        }
    }

    {
        let mut guard = state.lock().await;
        if guard.clients().get(slot).is_some() {
            tracing::info!(client = %id, %addr, "client disconnected");
            guard.exit_client(slot);
        }
    }

    drop(tx);
    let _ = writer.await;
}

/// Dispatch one frame for an already-logged-in client. Returns `false` when
/// the connection should terminate (EXIT, or the peer closed).
fn dispatch<E: Environment>(
    state: &mut ServerState<ClientHandle, E::Instant>,
    slot: usize,
    id: &str,
    frame: Frame,
) -> bool {
    match frame.msg_type_enum() {
        Ok(MessageType::Exit) => {
            state.exit_client(slot);
            false
        },

        Ok(MessageType::Join) => {
            let sid = frame.data_str();
            let reply = match state.join(slot, &sid) {
                JoinOutcome::Joined | JoinOutcome::AlreadyMember => text_reply(MessageType::JnAck, &sid),
                JoinOutcome::Failed { reason } => text_reply(MessageType::JnNak, &reason),
            };
            reply_to(state, slot, reply);
            true
        },

        Ok(MessageType::LeaveSess) => {
            let sid = frame.session_str();
            state.leave(slot, &sid);
            true
        },

        Ok(MessageType::NewSess) => {
            let sid = frame.data_str();
            let reply = match state.new_session(slot, &sid) {
                NewSessionOutcome::Created => text_reply(MessageType::NsAck, &sid),
                NewSessionOutcome::Failed { reason } => text_reply(MessageType::JnNak, &reason),
            };
            reply_to(state, slot, reply);
            true
        },

        Ok(MessageType::Message) => {
            let sid = frame.session_str();
            let mut outgoing = frame;
            outgoing.set_source(id);

            for target in state.message_targets(&sid) {
                if let Some(record) = state.clients().get(target) {
                    // Send failures don't abort the broadcast (§4.2).
                    let _ = record.handle.outbound.send(outgoing);
                }
            }
            true
        },

        Ok(MessageType::Query) => {
            let text = state.query_text();
            reply_to(state, slot, text_reply(MessageType::QuAck, &text));
            true
        },

        Ok(other) => {
            tracing::debug!(?other, "ignoring reply-only message type from client");
            true
        },

        Err(_) => {
            tracing::warn!("ignoring unrecognized message type from client");
            true
        },
    }
}

fn reply_to<I>(state: &ServerState<ClientHandle, I>, slot: usize, frame: Frame) {
    if let Some(record) = state.clients().get(slot) {
        let _ = record.handle.outbound.send(frame);
    }
}

