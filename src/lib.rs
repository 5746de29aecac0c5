//! # property-analytics
//!
//! In-memory columnar query engine for a large, static dataset of property
//! sale records. The dataset is loaded once from a parquet snapshot into
//! typed, nullable columns; a fixed set of parameterized operations then
//! answers aggregate questions (averages, medians, rankings, year-over-year
//! trends) with bounded-size, JSON-serializable results.
//!
//! - **Column store**: nullable string/float/integer/date columns, year and
//!   month derived from the contract date at load time
//! - **Filtering**: conjunctions of case-insensitive equality, inclusive
//!   numeric ranges, and integer equality; order-preserving row subsets
//! - **Aggregation**: grouped count/mean/median/min/max/sample-stddev with
//!   stable top-N ranking
//! - **Trends**: per-year aggregates and first-to-last growth rate
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use property_analytics::loader::{self, SnapshotConfig};
//! use property_analytics::query::{AveragePriceQuery, QueryEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = loader::load(&SnapshotConfig::new("property_data.parquet"))?;
//!     let engine = QueryEngine::new(Arc::new(dataset));
//!
//!     let response = engine.average_price(&AveragePriceQuery {
//!         locality: "Sydney".to_string(),
//!         year: Some(2023),
//!         property_type: None,
//!     })?;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod loader;
pub mod query;
pub mod schema;
