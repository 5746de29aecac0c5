use thiserror::Error;

pub mod column;
pub mod dataset;
pub mod filter;
pub mod stats;
pub mod trend;

pub use column::Column;
pub use dataset::Dataset;
pub use filter::{Filter, Predicate};
pub use stats::{group_stats, price_per_area, round2, top_n, RankMetric, ValueStats};
pub use trend::{growth_rate, yearly_trend, TrendPoint};

/// Error type used across the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Snapshot download error: {0}")]
    Download(#[from] reqwest::Error),

    #[error(
        "Snapshot not found at {0}; provide the file, or set SNAPSHOT_URL to fetch it at startup"
    )]
    SnapshotMissing(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' is not a {expected} column")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Schema error: {0}")]
    Schema(String),
}
