//! File-transfer sender binary.
//!
//! ```text
//! ftp-send <host> <port>
//! ftp <filename>          # read from stdin
//! ```

use std::path::Path;

use clap::Parser;
use ftp_sender::{error::SenderError, sender};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::UdpSocket,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Fragmented file transfer sender.
#[derive(Parser, Debug)]
#[command(name = "ftp-send")]
struct Args {
    /// Receiver host.
    host: String,
    /// Receiver port.
    port: u16,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "transfer failed");
            std::process::ExitCode::FAILURE
        },
    }
}

async fn run(args: &Args) -> Result<(), SenderError> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let line = stdin
        .next_line()
        .await
        .map_err(|e| SenderError::Transport(e.to_string()))?
        .ok_or(SenderError::BadStdinLine)?;

    let path = line.strip_prefix("ftp ").ok_or(SenderError::BadStdinLine)?.trim();
    let filename = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(SenderError::BadStdinLine)?
        .to_owned();

    let data = tokio::fs::read(path)
        .await
        .map_err(|source| SenderError::FileUnreadable { path: path.to_owned(), source })?;

    let socket =
        UdpSocket::bind("0.0.0.0:0").await.map_err(|e| SenderError::Transport(e.to_string()))?;
    socket
        .connect((args.host.as_str(), args.port))
        .await
        .map_err(|e| SenderError::Transport(e.to_string()))?;

    sender::handshake(&socket).await?;
    sender::send_file(&socket, &filename, &data).await
}
