use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::info;

use property_analytics::loader::{self, SnapshotConfig};
use property_analytics::query::{AveragePriceQuery, QueryEngine, SuburbsQuery};

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Smoke-run harness: load the snapshot and answer a query from the command
/// line. `property-analytics <locality> [year]` prints the average-price
/// summary; with no arguments it prints the first few suburbs.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = SnapshotConfig::from_env();
    let dataset = loader::load(&config)
        .with_context(|| format!("cannot load snapshot from {}", config.path.display()))?;
    info!("serving queries over {} records", dataset.row_count());

    let engine = QueryEngine::new(Arc::new(dataset));

    let mut args = std::env::args().skip(1);
    match args.next() {
        Some(locality) => {
            let year = args.next().and_then(|v| v.parse().ok());
            let response = engine.average_price(&AveragePriceQuery {
                locality,
                year,
                property_type: None,
            })?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        None => {
            let suburbs = engine.list_suburbs(&SuburbsQuery {
                limit: 20,
                search: None,
            })?;
            println!("{}", serde_json::to_string_pretty(&suburbs)?);
        }
    }

    Ok(())
}
