//! Storewatch HTTP Server Binary
//!
//! Main entry point for the storewatch REST API server. It initializes the
//! repository, optionally ingests a data directory, sets up the HTTP
//! router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin storewatch-server
//!
//! # Ingest CSVs at startup
//! DATA_DIR=./data cargo run --bin storewatch-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `DATA_DIR`: Directory of source CSVs to ingest at startup (optional)
//! - `RUST_LOG`: Log level (default: info)
//! - `STOREWATCH_*`: Engine settings, see `config`

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use storewatch::config::Config;
use storewatch::db;
use storewatch::http::{create_router, AppState};
use storewatch::ingest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    info!("Starting storewatch HTTP server");

    // Initialize global repository once and reuse it across the app
    db::init_repository()?;
    let repository = std::sync::Arc::clone(db::get_repository()?);
    info!("Repository initialized successfully");

    let config = Config::load();

    // Optional startup ingest
    if let Ok(data_dir) = env::var("DATA_DIR") {
        let data_dir = PathBuf::from(data_dir);
        let rows = ingest::load_data_dir(repository.as_ref(), &data_dir, true).await?;
        info!(rows, dir = %data_dir.display(), "Startup ingest complete");
    }

    // Create application state and router
    let state = AppState::new(repository, config);
    let app = create_router(state);

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
