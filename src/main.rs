//! `tollgate` — serves the user-lookup API.
//!
//! Run with:
//!   RUST_LOG=debug cargo run -- --addr 127.0.0.1:8080
//!
//! Try:
//!   curl -H 'Authorization: Bearer token' http://127.0.0.1:8080/api/v1/users/42
//!   curl -i http://127.0.0.1:8080/api/v1/users/42

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tollgate::ApiServer;

#[derive(Debug, Parser)]
#[command(version, about = "Serve the user-lookup API behind a logging and auth middleware chain")]
struct Cli {
    /// Address to listen on, as host:port.
    #[arg(long, env = "TOLLGATE_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    ApiServer::new(&cli.addr)
        .run()
        .await
        .with_context(|| format!("serving on {}", cli.addr))
}
