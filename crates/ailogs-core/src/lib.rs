//! Core types and pure transformations for ailogs
//!
//! This crate provides the usage-log data model, the error type, and the
//! synchronous building blocks of the log viewer pipeline: the filter
//! predicate, the sort comparator and the page slicer. It also defines the
//! `LogSource` trait that every log store implements.

pub mod aggregation_types;
pub mod error;
pub mod filters;
pub mod pagination;
pub mod sorting;
pub mod source;
pub mod timezone;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{AilogsError, Result};
pub use filters::{DateRange, FilterCriteria, NumericRange, filter_logs};
pub use pagination::{Page, paginate};
pub use sorting::{SortDirection, SortDirective, SortField};
pub use types::{DailyDate, ISOTimestamp, LogId, RequestType, TokenUsage, UsageLogRecord};
