//! File-transfer receiver binary.
//!
//! ```text
//! ftp-recv <port>
//! ```
//!
//! Received files land under `./saved/<filename>`; that directory must
//! pre-exist.

use std::path::PathBuf;

use clap::Parser;
use ftp_receiver::{error::ReceiverError, receiver};
use rand::{SeedableRng, rngs::StdRng};
use tokio::net::UdpSocket;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Fragmented file transfer receiver.
#[derive(Parser, Debug)]
#[command(name = "ftp-recv")]
struct Args {
    /// Port to bind.
    port: u16,

    /// Probability of silently dropping a valid fragment (loss simulator).
    #[arg(long, default_value_t = 0.01)]
    p_drop: f64,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let args = Args::parse();
    let out_dir = PathBuf::from("./saved");

    match run(&args, &out_dir).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "transfer failed");
            std::process::ExitCode::FAILURE
        },
    }
}

async fn run(args: &Args, out_dir: &std::path::Path) -> Result<(), ReceiverError> {
    let socket = UdpSocket::bind(("0.0.0.0", args.port))
        .await
        .map_err(|e| ReceiverError::Transport(e.to_string()))?;

    tracing::info!(port = args.port, "receiver listening");

    let mut rng = StdRng::from_entropy();
    receiver::serve(&socket, out_dir, args.p_drop, &mut rng).await
}
