//! Local development service implementing the hide/extract JSON API.
//!
//! ```bash
//! cargo run --bin dev_service -- --bind 127.0.0.1:5000
//! ```

use clap::Parser;
use log::{info, LevelFilter};

use stego_orchestrator::common::logging::init_logger;
use stego_orchestrator::service;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger(LevelFilter::Info);

    let args = Args::parse();

    info!("🚀 Initializing steganography development service...");

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);
    info!("📡 GET  /api/health");
    info!("📡 POST /api/hide");
    info!("📡 POST /api/extract");

    axum::serve(listener, service::router()).await?;

    Ok(())
}
