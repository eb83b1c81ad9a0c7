//! ailogs - Inspect, aggregate and export AI usage logs
//!
//! This library provides functionality to:
//! - Load usage logs from JSON / JSONL files
//! - Filter, sort and paginate them, with cached result sets
//! - Bucket them by day, break cost down by model and compare periods
//! - Export them as CSV or JSON
//!
//! # Examples
//!
//! ```no_run
//! use ailogs::{
//!     aggregation::Aggregator,
//!     data_loader::DataLoader,
//!     filters::FilterCriteria,
//!     query_cache::LogQueryCache,
//!     timezone::TimezoneConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ailogs::Result<()> {
//!     let cache = LogQueryCache::new(Arc::new(DataLoader::new(None)?));
//!
//!     let criteria = FilterCriteria::new().with_search("invoice");
//!     let logs = cache.all(&criteria).await?;
//!
//!     let aggregator = Aggregator::new(TimezoneConfig::default());
//!     let daily = aggregator.bucket_by_day(&logs, 7, chrono::Utc::now());
//!     println!("{} days", daily.len());
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod data_loader;
pub mod output;
pub mod query_cache;

pub use ailogs_core::{
    aggregation_types, error, filters, pagination, sorting, source, timezone, types,
};
pub use ailogs_export as export;

// Re-export commonly used types
pub use error::{AilogsError, Result};
pub use types::{DailyDate, ISOTimestamp, LogId, UsageLogRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
