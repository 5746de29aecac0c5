//! Startup gate: locate (or fetch) the columnar snapshot and load it.
//!
//! This runs exactly once before any query is served. A missing snapshot
//! with no configured fetch source is fatal; there is no retry path beyond
//! the single download attempt.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::engine::{Dataset, EngineError};

const DEFAULT_SNAPSHOT_PATH: &str = "property_data.parquet";
const FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Where the snapshot lives, and where to fetch it from if it does not.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    pub fetch_url: Option<String>,
}

impl SnapshotConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotConfig {
            path: path.into(),
            fetch_url: None,
        }
    }

    /// Deployment contract: `SNAPSHOT_PATH` points at the local file
    /// (default `property_data.parquet`), `SNAPSHOT_URL` optionally names a
    /// location to download it from on first start.
    pub fn from_env() -> Self {
        SnapshotConfig {
            path: PathBuf::from(
                env::var("SNAPSHOT_PATH").unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string()),
            ),
            fetch_url: env::var("SNAPSHOT_URL").ok(),
        }
    }
}

/// Load the dataset, downloading the snapshot first when configured.
pub fn load(config: &SnapshotConfig) -> Result<Dataset, EngineError> {
    if !config.path.exists() {
        match &config.fetch_url {
            Some(url) => fetch_snapshot(url, &config.path)?,
            None => {
                return Err(EngineError::SnapshotMissing(
                    config.path.display().to_string(),
                ))
            }
        }
    }
    Dataset::from_parquet(&config.path)
}

fn fetch_snapshot(url: &str, path: &Path) -> Result<(), EngineError> {
    info!("snapshot missing, downloading from {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    let bytes = response.bytes()?;
    std::fs::write(path, &bytes)?;
    info!(
        "downloaded snapshot ({:.1} MB) to {}",
        bytes.len() as f64 / 1024.0 / 1024.0,
        path.display()
    );
    Ok(())
}
