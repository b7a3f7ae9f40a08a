//! CSV ingest CLI.
//!
//! Loads `store_status.csv`, `menu_hours.csv`, and `timezones.csv` from a
//! data directory into the repository.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin storewatch-load -- --dir ./data
//!
//! # Append instead of truncating existing tables
//! cargo run --bin storewatch-load -- --dir ./data --no-replace
//! ```

use std::env;
use std::path::PathBuf;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use storewatch::db;
use storewatch::ingest;

fn parse_args() -> anyhow::Result<(PathBuf, bool)> {
    let mut dir = None;
    let mut replace = true;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dir" => {
                dir = Some(PathBuf::from(args.next().ok_or_else(|| {
                    anyhow::anyhow!("--dir requires a path argument")
                })?));
            }
            "--no-replace" => replace = false,
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    let dir = dir.ok_or_else(|| anyhow::anyhow!("--dir <path> is required"))?;
    Ok((dir, replace))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .init();

    let (dir, replace) = parse_args()?;

    db::init_repository()?;
    let repository = std::sync::Arc::clone(db::get_repository()?);

    let rows = ingest::load_data_dir(repository.as_ref(), &dir, replace).await?;
    info!(rows, dir = %dir.display(), replace, "Ingest complete");

    Ok(())
}
