//! Conferencing server binary.
//!
//! # Usage
//!
//! ```bash
//! confer-server 5000
//! ```

use clap::Parser;
use confer_server::{Server, system_env::SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Text conferencing server.
#[derive(Parser, Debug)]
#[command(name = "confer-server")]
#[command(about = "Text conferencing server: login, named sessions, broadcast, idle reaping")]
#[command(version)]
struct Args {
    /// Port to listen on.
    port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let addr = format!("0.0.0.0:{}", args.port);
    let env = SystemEnv::new();

    let server = match Server::bind(&addr, env).await {
        Ok(server) => server,
        Err(error) => {
            tracing::error!(%error, "failed to bind");
            return std::process::ExitCode::FAILURE;
        },
    };

    tracing::info!(%addr, "conferencing server listening");

    if let Err(error) = server.run().await {
        tracing::error!(%error, "server exited with an error");
        return std::process::ExitCode::FAILURE;
    }

    std::process::ExitCode::SUCCESS
}
