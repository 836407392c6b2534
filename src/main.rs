//! RAX File Manager - Entry Point
//!
//! A single-admin web file manager: browse, upload, download, and reorganize
//! files below a configured base directory over HTTP.

use log::{error, info};
use std::process;

use rax_file_manager::utils::logging::setup_logging;
use rax_file_manager::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    setup_logging();

    info!("Launching file manager...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        process::exit(1);
    }

    info!("Server stopped");
}
