//! Filtering module for usage logs
//!
//! [`FilterCriteria`] is the client-held set of constraints a user builds up
//! in the log viewer. Every field is optional and a default criteria object
//! matches every log. Active criteria are AND-combined.
//!
//! # Examples
//!
//! ```
//! use ailogs_core::filters::{FilterCriteria, NumericRange};
//! use ailogs_core::types::RequestType;
//!
//! let criteria = FilterCriteria::new()
//!     .with_search("invoice")
//!     .with_providers(vec!["openai".to_string()])
//!     .with_request_types(vec![RequestType::TextGeneration])
//!     .with_cost_range(NumericRange::at_least(0.5));
//! assert!(!criteria.is_empty());
//! assert!(FilterCriteria::new().is_empty());
//! ```

use crate::error::{AilogsError, Result};
use crate::sorting::SortDirective;
use crate::types::{FinishReason, RequestType, UsageLogRecord};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

/// Inclusive numeric range; a missing bound leaves that side open
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> NumericRange<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn between(min: T, max: T) -> Self {
        Self::new(Some(min), Some(max))
    }

    pub fn at_least(min: T) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: T) -> Self {
        Self::new(None, Some(max))
    }

    /// Whether `value` lies within `[min, max]`
    pub fn contains(&self, value: T) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

/// Inclusive creation-time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// The trailing `days` days ending at `now`
    ///
    /// Fails when the window would start before the earliest representable
    /// timestamp.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Result<Self> {
        let start = days_before(now, days)?;
        Ok(Self::new(Some(start), Some(now)))
    }

    /// Whole calendar days in `tz`, from the start of `since` to the last
    /// millisecond of `until`
    pub fn from_dates(since: Option<NaiveDate>, until: Option<NaiveDate>, tz: &Tz) -> Result<Self> {
        let start = since
            .map(|date| local_to_utc(date, NaiveTime::MIN, tz))
            .transpose()?;
        let end = until
            .map(|date| {
                let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
                    .ok_or_else(|| AilogsError::InvalidDate(date.to_string()))?;
                local_to_utc(date, end_of_day, tz)
            })
            .transpose()?;
        Ok(Self::new(start, end))
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| *ts >= start) && self.end.is_none_or(|end| *ts <= end)
    }

    /// Length of the window, when both ends are set
    pub fn duration(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// `now` moved back by `days` whole days
pub fn days_before(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| {
            AilogsError::validation("lastDays", format!("{days} days is outside the supported range"))
        })
}

fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: &Tz) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AilogsError::InvalidDate(format!("{date} {time} does not exist in {}", tz.name()))
        })
}

/// Filter configuration for usage logs
///
/// List-valued fields impose no constraint while empty. `sort` is carried
/// alongside the criteria because the cache keys on both, but it never
/// affects which logs match.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive free-text search
    pub search: Option<String>,
    pub user_id: Option<String>,
    pub model_ids: Vec<String>,
    pub providers: Vec<String>,
    pub request_types: Vec<RequestType>,
    pub success: Option<bool>,
    pub finish_reasons: Vec<FinishReason>,
    pub has_tool_calls: Option<bool>,
    pub has_files: Option<bool>,
    /// Cost bounds in USD
    pub cost_range: Option<NumericRange<f64>>,
    pub latency_range: Option<NumericRange<u64>>,
    /// Bounds on `usage.totalTokens`
    pub token_range: Option<NumericRange<u64>>,
    pub date_range: Option<DateRange>,
    pub sort: Option<SortDirective>,
}

impl FilterCriteria {
    /// Create criteria with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_model_ids(mut self, model_ids: Vec<String>) -> Self {
        self.model_ids = model_ids;
        self
    }

    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_request_types(mut self, request_types: Vec<RequestType>) -> Self {
        self.request_types = request_types;
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn with_finish_reasons(mut self, finish_reasons: Vec<FinishReason>) -> Self {
        self.finish_reasons = finish_reasons;
        self
    }

    pub fn with_has_tool_calls(mut self, has_tool_calls: bool) -> Self {
        self.has_tool_calls = Some(has_tool_calls);
        self
    }

    pub fn with_has_files(mut self, has_files: bool) -> Self {
        self.has_files = Some(has_files);
        self
    }

    pub fn with_cost_range(mut self, range: NumericRange<f64>) -> Self {
        self.cost_range = Some(range);
        self
    }

    pub fn with_latency_range(mut self, range: NumericRange<u64>) -> Self {
        self.latency_range = Some(range);
        self
    }

    pub fn with_token_range(mut self, range: NumericRange<u64>) -> Self {
        self.token_range = Some(range);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort = Some(sort);
        self
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// Whether no criterion is set, i.e. every log matches
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none()
            && self.user_id.is_none()
            && self.model_ids.is_empty()
            && self.providers.is_empty()
            && self.request_types.is_empty()
            && self.success.is_none()
            && self.finish_reasons.is_empty()
            && self.has_tool_calls.is_none()
            && self.has_files.is_none()
            && self.cost_range.is_none()
            && self.latency_range.is_none()
            && self.token_range.is_none()
            && self.date_range.is_none()
    }

    /// Check if a log passes every active criterion
    pub fn matches(&self, log: &UsageLogRecord) -> bool {
        if let Some(term) = self.search_term() {
            if !log.searchable_text().contains(&term) {
                return false;
            }
        }

        if let Some(user_id) = &self.user_id {
            if log.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }

        if !self.model_ids.is_empty() && !self.model_ids.contains(&log.model_id) {
            return false;
        }

        if !self.providers.is_empty() && !self.providers.contains(&log.provider) {
            return false;
        }

        if !self.request_types.is_empty() && !self.request_types.contains(&log.request_type) {
            return false;
        }

        if self.success.is_some_and(|success| log.success != success) {
            return false;
        }

        // A log without a finish reason cannot be a member of any list
        if !self.finish_reasons.is_empty()
            && !log
                .finish_reason
                .is_some_and(|reason| self.finish_reasons.contains(&reason))
        {
            return false;
        }

        if self
            .has_tool_calls
            .is_some_and(|wanted| log.has_tool_calls() != wanted)
        {
            return false;
        }

        if self.has_files.is_some_and(|wanted| log.has_files() != wanted) {
            return false;
        }

        if let Some(range) = &self.cost_range {
            if !range.contains(log.cost) {
                return false;
            }
        }

        if let Some(range) = &self.latency_range {
            if !range.contains(log.latency_ms) {
                return false;
            }
        }

        if let Some(range) = &self.token_range {
            if !range.contains(log.total_tokens()) {
                return false;
            }
        }

        if let Some(range) = &self.date_range {
            if !range.contains(log.created_at.inner()) {
                return false;
            }
        }

        true
    }

    /// Reject criteria that cannot describe any log
    pub fn validate(&self) -> Result<()> {
        if let Some(range) = &self.cost_range {
            if range.min.is_some_and(|min| min < 0.0) || range.max.is_some_and(|max| max < 0.0) {
                return Err(AilogsError::validation("costRange", "cost bounds must not be negative"));
            }
            if range.min.is_some_and(f64::is_nan) || range.max.is_some_and(f64::is_nan) {
                return Err(AilogsError::validation("costRange", "cost bounds must be numbers"));
            }
            if range.is_inverted() {
                return Err(AilogsError::validation("costRange", "min must not exceed max"));
            }
        }

        if self.latency_range.as_ref().is_some_and(NumericRange::is_inverted) {
            return Err(AilogsError::validation("latencyRange", "min must not exceed max"));
        }

        if self.token_range.as_ref().is_some_and(NumericRange::is_inverted) {
            return Err(AilogsError::validation("tokenRange", "min must not exceed max"));
        }

        if let Some(DateRange {
            start: Some(start),
            end: Some(end),
        }) = &self.date_range
        {
            if start > end {
                return Err(AilogsError::validation(
                    "dateRange",
                    "start must not be after end",
                ));
            }
        }

        Ok(())
    }

    /// Normalized, serialized form used as a cache key.
    ///
    /// Two criteria that select the same logs in the same order produce the
    /// same key regardless of list ordering, duplicates or search casing.
    pub fn cache_key(&self) -> String {
        let mut normalized = self.clone();
        normalized.search = self.search_term();
        normalized.model_ids.sort();
        normalized.model_ids.dedup();
        normalized.providers.sort();
        normalized.providers.dedup();
        normalized.request_types.sort();
        normalized.request_types.dedup();
        normalized.finish_reasons.sort();
        normalized.finish_reasons.dedup();
        if let Some(sort) = normalized.sort.as_mut() {
            if let Some(field) = sort.resolved_field() {
                sort.field = field.as_str().to_string();
            }
        }

        // Serializing plain data cannot fail; fall back to Debug just in case
        serde_json::to_string(&normalized).unwrap_or_else(|_| format!("{normalized:?}"))
    }

    /// Filter a stream of logs, passing errors through untouched
    pub fn filter_stream<S>(self, stream: S) -> impl Stream<Item = Result<UsageLogRecord>>
    where
        S: Stream<Item = Result<UsageLogRecord>>,
    {
        stream.filter_map(move |result| {
            let keep = match &result {
                Ok(log) => self.matches(log),
                Err(_) => true,
            };
            futures::future::ready(keep.then_some(result))
        })
    }
}

/// Filter already-fetched logs, preserving their relative order
pub fn filter_logs(logs: &[UsageLogRecord], criteria: &FilterCriteria) -> Vec<UsageLogRecord> {
    if criteria.is_empty() {
        return logs.to_vec();
    }

    logs.iter()
        .filter(|log| criteria.matches(log))
        .cloned()
        .collect()
}
