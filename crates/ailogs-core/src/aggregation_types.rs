//! Aggregation data types for ailogs
//!
//! Pure data structures produced by the aggregator for charts and summary
//! cards. They carry no behaviour beyond small constructors.

use crate::types::DailyDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: DailyDate,
    pub request_count: u64,
    /// Total cost for the day in USD
    pub total_cost: f64,
    pub total_tokens: u64,
    /// Mean latency rounded to whole milliseconds; 0 on an empty day
    pub avg_latency_ms: u64,
    /// Success rate rounded to two decimals; 0 on an empty day
    pub success_rate_percent: f64,
}

impl DayBucket {
    /// A zero-filled bucket
    pub fn empty(date: DailyDate) -> Self {
        Self {
            date,
            request_count: 0,
            total_cost: 0.0,
            total_tokens: 0,
            avg_latency_ms: 0,
            success_rate_percent: 0.0,
        }
    }
}

/// Cost share of one `provider/modelId` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    /// `provider/modelId`
    pub key: String,
    pub provider: String,
    pub model_id: String,
    pub request_count: u64,
    pub total_cost: f64,
    /// Share of the total cost across all groups, 0..=100
    pub percentage: f64,
}

/// Direction of the trend arrow shown next to a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "USD")]
    Usd,
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Milliseconds => write!(f, "ms"),
            Self::Percent => write!(f, "%"),
            Self::Usd => write!(f, "USD"),
        }
    }
}

/// Period-over-period comparison of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendMetric {
    pub name: String,
    /// Value for the current period
    pub value: f64,
    pub unit: MetricUnit,
    pub trend: Trend,
    /// Raw change of the value in percent, rounded to two decimals
    pub change_percent: f64,
}

/// Headline numbers for a set of logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate_percent: f64,
    /// Total cost in USD
    pub total_cost: f64,
    pub total_tokens: u64,
    pub avg_latency_ms: u64,
    pub cache_hit_count: u64,
    pub cache_hit_rate_percent: f64,
    pub tool_call_count: u64,
}
