//! Binary crate hosting the weather dashboard endpoint.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Loading configuration and initializing logging
//! - Serving `GET /api/weather` over warp

use clap::Parser;

mod cli;
mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
