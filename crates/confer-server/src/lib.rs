//! Text conferencing server.
//!
//! # Architecture
//!
//! The registries and dispatch logic live in [`confer_core`] and never touch
//! a socket or the wall clock. This crate provides the IO glue: [`acceptor`]
//! accepts TCP connections and spawns a handler task for each, [`handler`]
//! performs the login handshake and runs one connection's read/dispatch loop
//! plus its paired writer task, and [`reaper`] periodically evicts idle
//! clients. [`Server`] wires the three together behind the single
//! process-wide lock described in the concurrency model.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod acceptor;
pub mod codec;
pub mod error;
pub mod handler;
pub mod reaper;
pub mod system_env;

use std::{net::SocketAddr, sync::Arc};

use confer_core::{Environment, MAX_CLIENTS, MAX_SESSIONS, ServerState};
use confer_proto::Frame;
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify, mpsc},
};

pub use error::ServerError;

/// Per-client transport handle: an outbound frame queue plus a
/// forced-close signal the idle reaper can fire without touching the
/// socket directly (see [`handler::run_connection`]).
pub struct ClientHandle {
    /// Queue drained by this client's writer task.
    pub outbound: mpsc::UnboundedSender<Frame>,
    /// Fired by the reaper to force this connection's handler to terminate.
    pub close: Arc<Notify>,
}

/// The registries, parameterized on this server's environment.
pub type State<E> = ServerState<ClientHandle, <E as Environment>::Instant>;

/// Shared, lock-guarded state: one process-wide mutex over the client and
/// session registries (§5).
pub type SharedState<E> = Arc<Mutex<State<E>>>;

/// A bound conferencing server, ready to `run`.
pub struct Server<E: Environment> {
    listener: TcpListener,
    state: SharedState<E>,
    env: E,
}

impl<E: Environment> Server<E> {
    /// Bind a TCP listener at `addr` and initialize empty registries.
    ///
    /// # Errors
    ///
    /// [`ServerError::Transport`] if the address cannot be bound.
    pub async fn bind(addr: &str, env: E) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        let state = Arc::new(Mutex::new(ServerState::new(MAX_CLIENTS, MAX_SESSIONS)));
        Ok(Self { listener, state, env })
    }

    /// The address this server is actually bound to.
    ///
    /// # Errors
    ///
    /// Propagates the underlying `getsockname` failure, if any.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the acceptor loop and idle reaper until the process is killed.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self { listener, state, env } = self;

        let reaper_state = Arc::clone(&state);
        let reaper_env = env.clone();
        tokio::spawn(async move {
            reaper::run(reaper_state, reaper_env).await;
        });

        acceptor::run(listener, state, env).await;
        Ok(())
    }
}
