//! CLI interface for ailogs
//!
//! Filter flags are global, so every report can be narrowed the same way:
//!
//! ```bash
//! # Failed GPT-4o calls this week, most expensive first
//! ailogs list --model gpt-4o --status failed --last-days 7 --sort-by cost
//!
//! # Daily series for the last 30 days as JSON
//! ailogs daily --days 30 --json
//!
//! # CSV export of a few columns for one provider
//! ailogs export --provider anthropic --fields id,createdAt,cost --output ./exports
//! ```

use crate::error::{AilogsError, Result};
use crate::filters::{DateRange, FilterCriteria, NumericRange};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::sorting::{SortDirection, SortDirective};
use crate::types::{FinishReason, RequestType};
use ailogs_export::ExportFormat;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect, aggregate and export AI usage logs
#[derive(Parser, Debug, Clone)]
#[command(name = "ailogs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding *.jsonl / *.json log files
    #[arg(long, global = true, env = "AILOGS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Timezone for date grouping (e.g. "America/New_York", "Asia/Tokyo", "UTC")
    /// If not specified, uses the system's local timezone
    #[arg(long, short = 'z', global = true)]
    pub timezone: Option<String>,

    /// Use UTC for date grouping (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Success filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Success,
    Failed,
}

/// Flags that narrow which logs a command sees
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive text search over prompt, response, model, provider and error
    #[arg(long, short = 's', global = true)]
    pub search: Option<String>,

    /// Only logs from this user
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Model ids (comma separated)
    #[arg(long = "model", global = true, value_delimiter = ',')]
    pub models: Vec<String>,

    /// Providers (comma separated)
    #[arg(long = "provider", global = true, value_delimiter = ',')]
    pub providers: Vec<String>,

    /// Request types (comma separated)
    #[arg(long = "request-type", global = true, value_delimiter = ',')]
    pub request_types: Vec<RequestType>,

    #[arg(long, value_enum, global = true)]
    pub status: Option<StatusFilter>,

    /// Finish reasons (comma separated)
    #[arg(long = "finish-reason", global = true, value_delimiter = ',')]
    pub finish_reasons: Vec<FinishReason>,

    /// Only logs with (true) or without (false) tool calls
    #[arg(long, global = true)]
    pub has_tool_calls: Option<bool>,

    /// Only logs with (true) or without (false) file attachments
    #[arg(long, global = true)]
    pub has_files: Option<bool>,

    /// Minimum cost in USD
    #[arg(long, global = true)]
    pub min_cost: Option<f64>,

    /// Maximum cost in USD
    #[arg(long, global = true)]
    pub max_cost: Option<f64>,

    #[arg(long, global = true)]
    pub min_latency: Option<u64>,

    #[arg(long, global = true)]
    pub max_latency: Option<u64>,

    #[arg(long, global = true)]
    pub min_tokens: Option<u64>,

    #[arg(long, global = true)]
    pub max_tokens: Option<u64>,

    /// Filter by start date (YYYY-MM-DD or YYYY-MM)
    #[arg(long, global = true)]
    pub since: Option<String>,

    /// Filter by end date (YYYY-MM-DD or YYYY-MM)
    #[arg(long, global = true)]
    pub until: Option<String>,

    /// Only the trailing N days (overrides --since/--until)
    #[arg(long, global = true, value_parser = day_count())]
    pub last_days: Option<u32>,
}

/// Ordering flags
#[derive(Args, Debug, Clone)]
pub struct SortArgs {
    /// Field to sort by (createdAt, cost, latencyMs, totalTokens)
    #[arg(long, default_value = "createdAt")]
    pub sort_by: String,

    /// Sort direction
    #[arg(long, default_value = "desc")]
    pub order: SortDirection,
}

impl SortArgs {
    pub fn directive(&self) -> SortDirective {
        SortDirective::new(self.sort_by.clone(), self.order)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show a page of logs
    List {
        #[command(flatten)]
        sort: SortArgs,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },

    /// Show headline numbers
    Summary,

    /// Show per-day totals
    Daily {
        /// Number of days, ending today
        #[arg(long, default_value_t = 7, value_parser = day_count())]
        days: u32,
    },

    /// Show cost per provider and model
    Breakdown,

    /// Compare the last N days against the N days before them
    Trends {
        #[arg(long, default_value_t = 7, value_parser = day_count())]
        days: u32,
    },

    /// Export logs to a file
    Export {
        #[command(flatten)]
        sort: SortArgs,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Columns to export (comma separated); defaults to a standard set
        #[arg(long)]
        fields: Option<String>,

        /// Directory to write the export into
        #[arg(long, short = 'o', default_value = ".")]
        output: PathBuf,
    },

    /// Delete a single log by id
    Delete {
        /// Log id
        id: String,
    },
}

/// Largest window accepted by `--days` and `--last-days`
pub const MAX_WINDOW_DAYS: u32 = 36_500;

fn day_count() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_WINDOW_DAYS))
}

/// Parse a date filter string in YYYY-MM-DD or YYYY-MM format.
///
/// YYYY-MM resolves to the first day of the month.
pub fn parse_date_filter(date_str: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return Ok(date);
    }

    let parts: Vec<&str> = date_str.split('-').collect();
    if parts.len() != 2 {
        return Err(AilogsError::InvalidDate(format!(
            "Invalid date format '{date_str}'. Use YYYY-MM-DD or YYYY-MM"
        )));
    }

    let year = parts[0]
        .parse::<i32>()
        .map_err(|_| AilogsError::InvalidDate(format!("Invalid year in '{date_str}'")))?;
    let month = parts[1]
        .parse::<u32>()
        .map_err(|_| AilogsError::InvalidDate(format!("Invalid month in '{date_str}'")))?;

    if !(1..=12).contains(&month) {
        return Err(AilogsError::InvalidDate(format!(
            "Month must be between 1-12, got {month}"
        )));
    }

    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AilogsError::InvalidDate(format!("Invalid date: {date_str}")))
}

/// Like [`parse_date_filter`], but YYYY-MM resolves to the last day of the
/// month
pub fn parse_until_filter(date_str: &str) -> Result<NaiveDate> {
    let date = parse_date_filter(date_str)?;
    if NaiveDate::parse_from_str(date_str, "%Y-%m-%d").is_ok() {
        return Ok(date);
    }
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| AilogsError::InvalidDate(format!("Invalid date: {date_str}")))
}

fn range<T: PartialOrd + Copy>(min: Option<T>, max: Option<T>) -> Option<NumericRange<T>> {
    (min.is_some() || max.is_some()).then(|| NumericRange::new(min, max))
}

impl FilterArgs {
    /// Build filter criteria. Calendar dates are interpreted in `tz`.
    pub fn to_criteria(&self, tz: &Tz, now: DateTime<Utc>) -> Result<FilterCriteria> {
        let mut criteria = FilterCriteria::new()
            .with_model_ids(self.models.clone())
            .with_providers(self.providers.clone())
            .with_request_types(self.request_types.clone())
            .with_finish_reasons(self.finish_reasons.clone());

        if let Some(search) = &self.search {
            criteria = criteria.with_search(search.clone());
        }
        if let Some(user) = &self.user {
            criteria = criteria.with_user_id(user.clone());
        }
        if let Some(status) = self.status {
            criteria = criteria.with_success(status == StatusFilter::Success);
        }
        if let Some(has_tool_calls) = self.has_tool_calls {
            criteria = criteria.with_has_tool_calls(has_tool_calls);
        }
        if let Some(has_files) = self.has_files {
            criteria = criteria.with_has_files(has_files);
        }
        if let Some(cost) = range(self.min_cost, self.max_cost) {
            criteria = criteria.with_cost_range(cost);
        }
        if let Some(latency) = range(self.min_latency, self.max_latency) {
            criteria = criteria.with_latency_range(latency);
        }
        if let Some(tokens) = range(self.min_tokens, self.max_tokens) {
            criteria = criteria.with_token_range(tokens);
        }

        if let Some(days) = self.last_days {
            criteria = criteria.with_date_range(DateRange::last_days(days, now)?);
        } else if self.since.is_some() || self.until.is_some() {
            let since = self.since.as_deref().map(parse_date_filter).transpose()?;
            let until = self.until.as_deref().map(parse_until_filter).transpose()?;
            criteria = criteria.with_date_range(DateRange::from_dates(since, until, tz)?);
        }

        criteria.validate()?;
        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ailogs"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_date_filter() {
        assert_eq!(
            parse_date_filter("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            parse_date_filter("2024-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date_filter("2024-13").is_err());
        assert!(parse_date_filter("yesterday").is_err());
    }

    #[test]
    fn test_parse_until_filter_ends_month() {
        assert_eq!(
            parse_until_filter("2024-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            parse_until_filter("2023-12").unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
        assert_eq!(
            parse_until_filter("2024-02-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
        );
    }

    #[test]
    fn test_list_defaults() {
        let cli = parse(&["list"]);
        match cli.command {
            Command::List { sort, page, page_size } => {
                assert_eq!(page, 1);
                assert_eq!(page_size, DEFAULT_PAGE_SIZE);
                assert_eq!(sort.directive(), SortDirective::default());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_filters_after_subcommand() {
        let cli = parse(&[
            "daily",
            "--days",
            "30",
            "--model",
            "gpt-4o,claude-3-opus",
            "--status",
            "failed",
            "--request-type",
            "text-generation",
            "--min-cost",
            "0.5",
        ]);
        assert!(matches!(cli.command, Command::Daily { days: 30 }));
        assert_eq!(cli.filters.models, vec!["gpt-4o", "claude-3-opus"]);

        let criteria = cli.filters.to_criteria(&chrono_tz::UTC, Utc::now()).unwrap();
        assert_eq!(criteria.success, Some(false));
        assert_eq!(criteria.request_types, vec![RequestType::TextGeneration]);
        assert_eq!(criteria.cost_range, Some(NumericRange::new(Some(0.5), None)));
    }

    #[test]
    fn test_export_args() {
        let cli = parse(&["export", "--format", "json", "--fields", "id,cost", "-o", "/tmp"]);
        match cli.command {
            Command::Export { format, fields, output, .. } => {
                assert_eq!(format, ExportFormat::Json);
                assert_eq!(fields.as_deref(), Some("id,cost"));
                assert_eq!(output, PathBuf::from("/tmp"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_date_flags_build_range() {
        let args = FilterArgs {
            since: Some("2024-03-01".into()),
            until: Some("2024-03".into()),
            ..Default::default()
        };
        let criteria = args.to_criteria(&chrono_tz::UTC, Utc::now()).unwrap();
        let range = criteria.date_range.unwrap();
        assert_eq!(range.start, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert!(range.contains(&Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap()));
        assert!(!range.contains(&Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_last_days_wins() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let args = FilterArgs {
            since: Some("2020-01-01".into()),
            last_days: Some(7),
            ..Default::default()
        };
        let criteria = args.to_criteria(&chrono_tz::UTC, now).unwrap();
        assert_eq!(criteria.date_range, Some(DateRange::last_days(7, now).unwrap()));
    }

    #[test]
    fn test_huge_last_days_is_an_error() {
        let args = FilterArgs {
            last_days: Some(100_000_000),
            ..Default::default()
        };
        let err = args.to_criteria(&chrono_tz::UTC, Utc::now()).unwrap_err();
        assert!(matches!(err, AilogsError::Validation { ref field, .. } if field == "lastDays"));
    }

    #[test]
    fn test_day_counts_are_bounded() {
        assert!(Cli::try_parse_from(["ailogs", "list", "--last-days", "100000000"]).is_err());
        assert!(Cli::try_parse_from(["ailogs", "daily", "--days", "100000000"]).is_err());
        assert!(Cli::try_parse_from(["ailogs", "trends", "--days", "0"]).is_err());
        assert!(Cli::try_parse_from(["ailogs", "trends", "--days", "36500"]).is_ok());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let args = FilterArgs {
            min_latency: Some(500),
            max_latency: Some(100),
            ..Default::default()
        };
        assert!(args.to_criteria(&chrono_tz::UTC, Utc::now()).is_err());
    }
}
