//! Output formatting module
//!
//! Renders log pages and aggregates either as terminal tables or as JSON for
//! scripts and dashboards.
//!
//! # Examples
//!
//! ```
//! use ailogs::output::get_formatter;
//! use ailogs::pagination::paginate;
//! use ailogs::types::UsageLogRecord;
//!
//! let page = paginate::<UsageLogRecord>(&[], 50, 1);
//!
//! let formatter = get_formatter(true, chrono_tz::UTC);
//! assert!(formatter.format_logs(&page).contains("\"totalItems\": 0"));
//! ```

use crate::aggregation_types::{CostBreakdown, DayBucket, MetricUnit, TrendMetric, UsageSummary};
use crate::pagination::Page;
use crate::types::UsageLogRecord;
use chrono_tz::Tz;
use prettytable::{Table, format, row};
use serde_json::{Value, json};

/// Longest prompt preview shown in the log table
const PROMPT_PREVIEW_CHARS: usize = 40;

/// Trait for output formatters
pub trait OutputFormatter {
    /// One page of logs
    fn format_logs(&self, page: &Page<UsageLogRecord>) -> String;

    fn format_daily(&self, buckets: &[DayBucket]) -> String;

    fn format_breakdown(&self, rows: &[CostBreakdown]) -> String;

    fn format_trends(&self, metrics: &[TrendMetric]) -> String;

    fn format_summary(&self, summary: &UsageSummary) -> String;
}

/// Table formatter for human-readable output
///
/// Numbers get thousands separators. Per-request costs are shown with four
/// decimals since single calls often cost fractions of a cent.
pub struct TableFormatter {
    tz: Tz,
}

impl TableFormatter {
    /// Timestamps are shown in `tz`
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    fn format_currency(amount: f64) -> String {
        format!("${amount:.4}")
    }

    fn format_percent(value: f64) -> String {
        format!("{value:.2}%")
    }

    fn preview(text: &str) -> String {
        let single_line = text.replace(['\n', '\r'], " ");
        if single_line.chars().count() <= PROMPT_PREVIEW_CHARS {
            return single_line;
        }
        let cut: String = single_line.chars().take(PROMPT_PREVIEW_CHARS - 1).collect();
        format!("{cut}…")
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }
}

impl OutputFormatter for TableFormatter {
    fn format_logs(&self, page: &Page<UsageLogRecord>) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Time",
            b -> "Model",
            b -> "Type",
            b -> "Status",
            b -> "Tokens",
            b -> "Cost",
            b -> "Latency",
            b -> "Prompt"
        ]);

        for log in &page.items {
            let time = log
                .created_at
                .inner()
                .with_timezone(&self.tz)
                .format("%Y-%m-%d %H:%M:%S");
            let status = if log.success { "ok" } else { "error" };
            table.add_row(row![
                time,
                format!("{}/{}", log.provider, log.model_id),
                log.request_type,
                status,
                r -> Self::format_number(log.total_tokens()),
                r -> Self::format_currency(log.cost),
                r -> format!("{} ms", Self::format_number(log.latency_ms)),
                Self::preview(&log.prompt)
            ]);
        }

        format!(
            "{}Page {} of {} ({} logs)\n",
            table,
            page.page,
            page.total_pages.max(1),
            Self::format_number(page.total_items as u64)
        )
    }

    fn format_daily(&self, buckets: &[DayBucket]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Date",
            b -> "Requests",
            b -> "Tokens",
            b -> "Cost",
            b -> "Avg Latency",
            b -> "Success"
        ]);

        for bucket in buckets {
            table.add_row(row![
                bucket.date,
                r -> Self::format_number(bucket.request_count),
                r -> Self::format_number(bucket.total_tokens),
                r -> Self::format_currency(bucket.total_cost),
                r -> format!("{} ms", Self::format_number(bucket.avg_latency_ms)),
                r -> Self::format_percent(bucket.success_rate_percent)
            ]);
        }

        table.to_string()
    }

    fn format_breakdown(&self, rows: &[CostBreakdown]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Model",
            b -> "Requests",
            b -> "Cost",
            b -> "Share"
        ]);

        for entry in rows {
            table.add_row(row![
                entry.key,
                r -> Self::format_number(entry.request_count),
                r -> Self::format_currency(entry.total_cost),
                r -> Self::format_percent(entry.percentage)
            ]);
        }

        table.to_string()
    }

    fn format_trends(&self, metrics: &[TrendMetric]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![b -> "Metric", b -> "Value", b -> "Change", b -> "Trend"]);

        for metric in metrics {
            let value = match metric.unit {
                MetricUnit::Usd => Self::format_currency(metric.value),
                unit => format!("{} {}", metric.value, unit),
            };
            table.add_row(row![
                metric.name,
                r -> value,
                r -> format!("{:+.2}%", metric.change_percent),
                c -> metric.trend
            ]);
        }

        table.to_string()
    }

    fn format_summary(&self, summary: &UsageSummary) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![b -> "Metric", b -> "Value"]);

        table.add_row(row!["Requests", r -> Self::format_number(summary.total_requests)]);
        table.add_row(row!["Failed", r -> Self::format_number(summary.failed_requests)]);
        table.add_row(row!["Success Rate", r -> Self::format_percent(summary.success_rate_percent)]);
        table.add_row(row!["Total Cost", r -> Self::format_currency(summary.total_cost)]);
        table.add_row(row!["Total Tokens", r -> Self::format_number(summary.total_tokens)]);
        table.add_row(row![
            "Avg Latency",
            r -> format!("{} ms", Self::format_number(summary.avg_latency_ms))
        ]);
        table.add_row(row![
            "Cache Hits",
            r -> format!(
                "{} ({})",
                Self::format_number(summary.cache_hit_count),
                Self::format_percent(summary.cache_hit_rate_percent)
            )
        ]);
        table.add_row(row!["Tool Calls", r -> Self::format_number(summary.tool_call_count)]);

        table.to_string()
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty(value: Value) -> String {
        format!("{value:#}")
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_logs(&self, page: &Page<UsageLogRecord>) -> String {
        Self::pretty(json!(page))
    }

    fn format_daily(&self, buckets: &[DayBucket]) -> String {
        Self::pretty(json!({ "daily": buckets }))
    }

    fn format_breakdown(&self, rows: &[CostBreakdown]) -> String {
        let total_cost: f64 = rows.iter().map(|r| r.total_cost).sum();
        Self::pretty(json!({
            "breakdown": rows,
            "totalCost": total_cost,
        }))
    }

    fn format_trends(&self, metrics: &[TrendMetric]) -> String {
        Self::pretty(json!({ "trends": metrics }))
    }

    fn format_summary(&self, summary: &UsageSummary) -> String {
        Self::pretty(json!({ "summary": summary }))
    }
}

/// Pick a formatter for the `--json` flag
pub fn get_formatter(json: bool, tz: Tz) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new(tz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::Aggregator;
    use crate::aggregation_types::Trend;
    use crate::pagination::paginate;
    use crate::types::{DailyDate, ISOTimestamp, LogId, LogMetadata, RequestType, TokenUsage};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample_log() -> UsageLogRecord {
        UsageLogRecord {
            id: LogId::new("log_42"),
            created_at: ISOTimestamp::new(Utc.with_ymd_and_hms(2024, 7, 1, 23, 30, 0).unwrap()),
            user_id: Some("user_1".to_string()),
            model_id: "gpt-4o".to_string(),
            provider: "openai".to_string(),
            request_type: RequestType::TextGeneration,
            success: false,
            prompt: "Summarize the quarterly hiring plan for the design team please".to_string(),
            response: None,
            error_message: Some("timeout".to_string()),
            usage: TokenUsage::new(1200, 300),
            cost: 0.0123,
            latency_ms: 1500,
            finish_reason: None,
            warnings: Vec::new(),
            tool_calls: Vec::new(),
            files: Vec::new(),
            metadata: LogMetadata::default(),
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(TableFormatter::format_number(1234567), "1,234,567");
        assert_eq!(TableFormatter::format_number(999), "999");
        assert_eq!(TableFormatter::format_number(0), "0");
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(TableFormatter::format_currency(0.0123), "$0.0123");
        assert_eq!(TableFormatter::format_currency(0.0), "$0.0000");
        assert_eq!(TableFormatter::format_currency(12.5), "$12.5000");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(TableFormatter::preview("short\nprompt"), "short prompt");
        let long = "é".repeat(60);
        let preview = TableFormatter::preview(&long);
        assert_eq!(preview.chars().count(), PROMPT_PREVIEW_CHARS);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_table_logs_uses_timezone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        let page = paginate(&[sample_log()], 50, 1);
        let output = TableFormatter::new(tokyo).format_logs(&page);
        assert!(output.contains("2024-07-02 08:30:00"));
        assert!(output.contains("openai/gpt-4o"));
        assert!(output.contains("1,500"));
        assert!(output.contains("Page 1 of 1 (1 logs)"));
    }

    #[test]
    fn test_table_daily_and_breakdown() {
        let formatter = TableFormatter::new(chrono_tz::UTC);
        let bucket = DayBucket::empty(DailyDate::new(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
        assert!(formatter.format_daily(&[bucket]).contains("2024-07-01"));

        let breakdown = Aggregator::cost_breakdown(&[sample_log()]);
        let output = formatter.format_breakdown(&breakdown);
        assert!(output.contains("openai/gpt-4o"));
        assert!(output.contains("100.00%"));
    }

    #[test]
    fn test_table_trends() {
        let metric = TrendMetric {
            name: "Average Cost".to_string(),
            value: 0.5,
            unit: MetricUnit::Usd,
            trend: Trend::Down,
            change_percent: 12.5,
        };
        let output = TableFormatter::new(chrono_tz::UTC).format_trends(&[metric]);
        assert!(output.contains("$0.5000"));
        assert!(output.contains("+12.50%"));
        assert!(output.contains("down"));
    }

    #[test]
    fn test_json_logs_page() {
        let page = paginate(&[sample_log()], 50, 1);
        let output = JsonFormatter.format_logs(&page);
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["totalItems"], 1);
        assert_eq!(parsed["items"][0]["id"], "log_42");
        assert_eq!(parsed["items"][0]["createdAt"], "2024-07-01T23:30:00Z");
    }

    #[test]
    fn test_json_summary_and_trends() {
        let summary = Aggregator::summarize(&[sample_log()]);
        let parsed: Value = serde_json::from_str(&JsonFormatter.format_summary(&summary)).unwrap();
        assert_eq!(parsed["summary"]["failedRequests"], 1);

        let metrics = Aggregator::compute_trend_metrics(&[sample_log()], &[]);
        let parsed: Value = serde_json::from_str(&JsonFormatter.format_trends(&metrics)).unwrap();
        assert_eq!(parsed["trends"][0]["unit"], "ms");
        assert_eq!(parsed["trends"][0]["trend"], "stable");
    }

    #[test]
    fn test_get_formatter() {
        let json_formatter = get_formatter(true, chrono_tz::UTC);
        assert!(json_formatter.format_daily(&[]).contains("\"daily\""));
        let table_formatter = get_formatter(false, chrono_tz::UTC);
        assert!(table_formatter.format_breakdown(&[]).contains("Model"));
    }
}
