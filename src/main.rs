//! Upload server - Entry Point
//!
//! Accepts batches of files over a line protocol and stores them under the
//! configured storage root.

use log::{error, info};
use std::process;

use userupload_server::error::ServerError;
use userupload_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // env_logger picks up the RUST_LOG environment variable
    env_logger::init();

    info!("Launching upload server...");

    if let Err(e) = run().await {
        error!("Server startup failed: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let server = Server::new(config).await?;
    server.start().await;
    Ok(())
}
