//! Aggregation module for summarizing usage logs
//!
//! Turns a filtered set of logs into the series and cards the dashboard
//! shows: zero-filled per-day buckets, a cost breakdown by provider and
//! model, period-over-period trends, and a headline summary.
//!
//! Every function here is a pure pass over already-fetched logs.
//!
//! # Examples
//!
//! ```
//! use ailogs::aggregation::{Aggregator, calculate_trend_change};
//! use ailogs::timezone::TimezoneConfig;
//!
//! let aggregator = Aggregator::new(TimezoneConfig::utc());
//! let buckets = aggregator.bucket_by_day(&[], 7, chrono::Utc::now());
//! assert_eq!(buckets.len(), 7);
//!
//! assert_eq!(calculate_trend_change(120.0, 100.0), 20.0);
//! assert_eq!(calculate_trend_change(100.0, 0.0), 0.0);
//! ```

use crate::aggregation_types::{
    CostBreakdown, DayBucket, MetricUnit, Trend, TrendMetric, UsageSummary,
};
use crate::error::Result;
use crate::filters::{DateRange, days_before};
use crate::timezone::TimezoneConfig;
use crate::types::{DailyDate, UsageLogRecord};
use chrono::{DateTime, Days, Utc};
use std::collections::BTreeMap;

/// Changes smaller than this many percent are shown as stable
pub const STABLE_THRESHOLD_PERCENT: f64 = 5.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Percent change from `previous` to `current`; 0 when `previous` is 0
pub fn calculate_trend_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// Accumulator for one day
#[derive(Default)]
struct DayAccumulator {
    requests: u64,
    cost: f64,
    tokens: u64,
    latency_sum: u64,
    successes: u64,
}

impl DayAccumulator {
    fn add_log(&mut self, log: &UsageLogRecord) {
        self.requests += 1;
        self.cost += log.cost;
        self.tokens += log.total_tokens();
        self.latency_sum += log.latency_ms;
        if log.success {
            self.successes += 1;
        }
    }

    fn into_bucket(self, date: DailyDate) -> DayBucket {
        if self.requests == 0 {
            return DayBucket::empty(date);
        }
        DayBucket {
            date,
            request_count: self.requests,
            total_cost: self.cost,
            total_tokens: self.tokens,
            avg_latency_ms: (self.latency_sum as f64 / self.requests as f64).round() as u64,
            success_rate_percent: round2(percent(self.successes, self.requests)),
        }
    }
}

/// Period averages compared by the trend cards
struct PeriodAverages {
    latency_ms: f64,
    success_rate: f64,
    cost: f64,
}

impl PeriodAverages {
    fn of(logs: &[UsageLogRecord]) -> Self {
        if logs.is_empty() {
            return Self {
                latency_ms: 0.0,
                success_rate: 0.0,
                cost: 0.0,
            };
        }
        let n = logs.len() as f64;
        let successes = logs.iter().filter(|l| l.success).count() as u64;
        Self {
            latency_ms: logs.iter().map(|l| l.latency_ms as f64).sum::<f64>() / n,
            success_rate: percent(successes, logs.len() as u64),
            cost: logs.iter().map(|l| l.cost).sum::<f64>() / n,
        }
    }
}

/// Map a raw change to an arrow.
///
/// For lower-is-better metrics a rising value is shown as a downward trend.
fn trend_direction(change_percent: f64, lower_is_better: bool) -> Trend {
    if change_percent.abs() < STABLE_THRESHOLD_PERCENT {
        return Trend::Stable;
    }
    match (change_percent > 0.0, lower_is_better) {
        (true, false) | (false, true) => Trend::Up,
        (true, true) | (false, false) => Trend::Down,
    }
}

fn trend_metric(
    name: &str,
    current: f64,
    previous: f64,
    unit: MetricUnit,
    lower_is_better: bool,
) -> TrendMetric {
    let change = calculate_trend_change(current, previous);
    TrendMetric {
        name: name.to_string(),
        value: current,
        unit,
        trend: trend_direction(change, lower_is_better),
        change_percent: round2(change),
    }
}

/// Main aggregation engine
pub struct Aggregator {
    timezone_config: TimezoneConfig,
}

impl Aggregator {
    /// Create a new Aggregator
    pub fn new(timezone_config: TimezoneConfig) -> Self {
        Self { timezone_config }
    }

    /// Get the timezone configuration
    pub fn timezone_config(&self) -> &TimezoneConfig {
        &self.timezone_config
    }

    /// One bucket per day for the trailing `window_days` days ending on
    /// `now`'s calendar day, oldest first. Days without logs are zero-filled
    /// and logs outside the window are ignored.
    pub fn bucket_by_day(
        &self,
        logs: &[UsageLogRecord],
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Vec<DayBucket> {
        let today = *self.timezone_config.today(now).inner();
        let mut days: BTreeMap<DailyDate, DayAccumulator> = (0..window_days)
            .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
            .map(|date| (DailyDate::new(date), DayAccumulator::default()))
            .collect();

        for log in logs {
            let date = log
                .created_at
                .to_daily_date_with_tz(&self.timezone_config.tz);
            if let Some(acc) = days.get_mut(&date) {
                acc.add_log(log);
            }
        }

        days.into_iter()
            .map(|(date, acc)| acc.into_bucket(date))
            .collect()
    }

    /// Cost per `provider/modelId`, most expensive first
    pub fn cost_breakdown(logs: &[UsageLogRecord]) -> Vec<CostBreakdown> {
        let mut groups: BTreeMap<(String, String), (u64, f64)> = BTreeMap::new();
        for log in logs {
            let entry = groups
                .entry((log.provider.clone(), log.model_id.clone()))
                .or_default();
            entry.0 += 1;
            entry.1 += log.cost;
        }

        let total_cost: f64 = groups.values().map(|(_, cost)| cost).sum();

        let mut breakdown: Vec<CostBreakdown> = groups
            .into_iter()
            .map(|((provider, model_id), (request_count, cost))| CostBreakdown {
                key: format!("{provider}/{model_id}"),
                provider,
                model_id,
                request_count,
                total_cost: cost,
                percentage: if total_cost > 0.0 {
                    round2(cost / total_cost * 100.0)
                } else {
                    0.0
                },
            })
            .collect();

        // Stable sort keeps key order among equal costs
        breakdown.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
        breakdown
    }

    /// Compare average latency, success rate and cost between two periods
    pub fn compute_trend_metrics(
        current: &[UsageLogRecord],
        previous: &[UsageLogRecord],
    ) -> Vec<TrendMetric> {
        let now = PeriodAverages::of(current);
        let before = PeriodAverages::of(previous);

        vec![
            trend_metric(
                "Average Latency",
                now.latency_ms.round(),
                before.latency_ms.round(),
                MetricUnit::Milliseconds,
                true,
            ),
            trend_metric(
                "Success Rate",
                round2(now.success_rate),
                round2(before.success_rate),
                MetricUnit::Percent,
                false,
            ),
            trend_metric("Average Cost", now.cost, before.cost, MetricUnit::Usd, true),
        ]
    }

    /// Split logs into the trailing `days` window ending at `now` and the
    /// window of equal length right before it
    pub fn trend_periods(
        logs: &[UsageLogRecord],
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<(Vec<UsageLogRecord>, Vec<UsageLogRecord>)> {
        let current = DateRange::last_days(days, now)?;
        let boundary = days_before(now, days)?;
        let previous = DateRange::new(Some(days_before(boundary, days)?), Some(boundary));

        let mut current_logs = Vec::new();
        let mut previous_logs = Vec::new();
        for log in logs {
            let ts = log.created_at.inner();
            if current.contains(ts) {
                current_logs.push(log.clone());
            } else if previous.contains(ts) {
                previous_logs.push(log.clone());
            }
        }
        Ok((current_logs, previous_logs))
    }

    /// Headline numbers for the summary cards
    pub fn summarize(logs: &[UsageLogRecord]) -> UsageSummary {
        let mut summary = UsageSummary::default();
        let mut latency_sum = 0u64;

        for log in logs {
            summary.total_requests += 1;
            if log.success {
                summary.successful_requests += 1;
            } else {
                summary.failed_requests += 1;
            }
            summary.total_cost += log.cost;
            summary.total_tokens += log.total_tokens();
            latency_sum += log.latency_ms;
            if log.is_cache_hit() {
                summary.cache_hit_count += 1;
            }
            summary.tool_call_count += log.tool_calls.len() as u64;
        }

        if summary.total_requests > 0 {
            summary.avg_latency_ms =
                (latency_sum as f64 / summary.total_requests as f64).round() as u64;
        }
        summary.success_rate_percent =
            round2(percent(summary.successful_requests, summary.total_requests));
        summary.cache_hit_rate_percent =
            round2(percent(summary.cache_hit_count, summary.total_requests));
        summary
    }
}
