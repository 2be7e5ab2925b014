//! Acceptor (L): accepts new TCP connections and hands each off to a
//! connection handler task. The login handshake itself happens inside
//! [`crate::handler::run_connection`], not here — the acceptor's only job is
//! to turn `accept()` into a spawned task per §5 ("accept blocks").

use confer_core::Environment;
use tokio::net::TcpListener;

use crate::{SharedState, handler};

/// Accept connections until the listener errors out or the process exits.
pub async fn run<E: Environment>(listener: TcpListener, state: SharedState<E>, env: E) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = state.clone();
                let env = env.clone();
                tokio::spawn(async move {
                    handler::run_connection(stream, addr, state, env).await;
                });
            },
            Err(error) => {
                tracing::warn!(%error, "accept failed");
            },
        }
    }
}
