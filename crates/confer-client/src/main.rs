//! Interactive conferencing client.
//!
//! No command-line arguments; connection parameters are supplied via the
//! `/login <id> <pw> <ip> <port>` REPL command (§6).

// Terminal output is this binary's actual UI, not incidental logging.
#![allow(clippy::print_stdout)]

use confer_client::{
    app::{Command, Session},
    transport,
};
use confer_proto::{Frame, MessageType};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut session = match log_in(&mut lines).await {
        Some(session) => session,
        None => return,
    };

    println!("logged in as {}", session.id);

    loop {
        tokio::select! {
            biased;

            frame = session.connection.inbound.recv() => {
                let Some(frame) = frame else {
                    println!("disconnected by server");
                    return;
                };
                print_frame(&mut session, &frame);
            }

            line = lines.next_line() => {
                let Ok(Some(line)) = line else { return };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line).and_then(|command| session.apply(command)) {
                    Ok(true) => {},
                    Ok(false) => return,
                    Err(error) => println!("{error}"),
                }
            }
        }
    }
}

/// Loop reading `/login` attempts from stdin until one succeeds.
async fn log_in(lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>) -> Option<Session> {
    loop {
        let line = lines.next_line().await.ok().flatten()?;
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(error) => {
                println!("{error}");
                continue;
            },
        };

        let Command::Login { id, password, addr } = command else {
            println!("not logged in; use /login <id> <pw> <ip> <port>");
            continue;
        };

        match transport::login(addr, &id, &password).await {
            Ok(connection) => return Some(Session::new(connection, id)),
            Err(error) => println!("{error}"),
        }
    }
}

/// Handle one server frame: apply it to `session`'s pending-join state (if
/// relevant) and print it for the user.
fn print_frame(session: &mut Session, frame: &Frame) {
    match frame.msg_type_enum() {
        Ok(MessageType::Message) => {
            println!("[{}] {}: {}", frame.session_str(), frame.source_str(), frame.data_str());
        },
        Ok(MessageType::JnAck) => {
            let sid = frame.data_str();
            session.confirm_pending(&sid);
            println!("joined {sid}");
        },
        Ok(MessageType::JnNak) => {
            session.clear_pending();
            println!("join failed: {}", frame.data_str());
        },
        Ok(MessageType::NsAck) => {
            let sid = frame.data_str();
            session.confirm_pending(&sid);
            println!("created session {sid}");
        },
        Ok(MessageType::QuAck) => println!("{}", frame.data_str()),
        Ok(other) => tracing::debug!(?other, "unhandled frame from server"),
        Err(_) => tracing::warn!("unrecognized frame from server"),
    }
}
