//! Core domain types for ailogs
//!
//! This module contains the fundamental types used throughout the ailogs crates.
//! The central type is [`UsageLogRecord`], one logged AI model invocation with
//! its cost, latency, token and outcome data.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Strongly-typed log identifier
///
/// Opaque and unique within a result set, so it doubles as the row key in
/// tables and exports.
///
/// # Examples
/// ```
/// use ailogs_core::types::LogId;
///
/// let id = LogId::new("k57a2b3c");
/// assert_eq!(id.as_str(), "k57a2b3c");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(String);

impl LogId {
    /// Create a new LogId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LogId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// ISO timestamp wrapper for UTC timestamps
///
/// # Examples
/// ```
/// use ailogs_core::types::ISOTimestamp;
/// use chrono::{TimeZone, Utc};
///
/// let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
/// let timestamp = ISOTimestamp::new(dt);
///
/// let daily = timestamp.to_daily_date();
/// assert_eq!(daily.format("%Y-%m-%d"), "2024-01-15");
/// assert_eq!(timestamp.timestamp_millis(), 1_705_314_600_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ISOTimestamp(DateTime<Utc>);

impl ISOTimestamp {
    /// Create a new ISOTimestamp
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner DateTime
    pub fn inner(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Milliseconds since the Unix epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Convert to DailyDate using UTC
    pub fn to_daily_date(&self) -> DailyDate {
        DailyDate::new(self.0.date_naive())
    }

    /// Convert to DailyDate using specified timezone
    pub fn to_daily_date_with_tz(&self, tz: &Tz) -> DailyDate {
        DailyDate::new(self.0.with_timezone(tz).date_naive())
    }

    /// RFC 3339 rendering with millisecond precision
    pub fn to_rfc3339(&self) -> String {
        self.0
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for ISOTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// Calendar date used as an aggregation bucket key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyDate(NaiveDate);

impl DailyDate {
    /// Create a new DailyDate
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Get the inner NaiveDate
    pub fn inner(&self) -> &NaiveDate {
        &self.0
    }

    /// Format with a chrono format string
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }
}

impl fmt::Display for DailyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Category of AI request that produced a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestType {
    TextGeneration,
    ObjectGeneration,
    Embedding,
    ImageGeneration,
    Test,
}

impl RequestType {
    /// Wire name of the request type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextGeneration => "text-generation",
            Self::ObjectGeneration => "object-generation",
            Self::Embedding => "embedding",
            Self::ImageGeneration => "image-generation",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "text-generation" | "text" => Ok(Self::TextGeneration),
            "object-generation" | "object" => Ok(Self::ObjectGeneration),
            "embedding" => Ok(Self::Embedding),
            "image-generation" | "image" => Ok(Self::ImageGeneration),
            "test" => Ok(Self::Test),
            _ => Err(format!("Invalid request type: {s}")),
        }
    }
}

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    #[serde(other)]
    Other,
}

impl FinishReason {
    /// Wire name of the finish reason
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content-filter",
            Self::ToolCalls => "tool-calls",
            Self::Error => "error",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinishReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "stop" => Ok(Self::Stop),
            "length" => Ok(Self::Length),
            "content-filter" => Ok(Self::ContentFilter),
            "tool-calls" => Ok(Self::ToolCalls),
            "error" => Ok(Self::Error),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid finish reason: {s}")),
        }
    }
}

/// Token counts reported for a single request
///
/// # Examples
/// ```
/// use ailogs_core::types::TokenUsage;
///
/// let usage = TokenUsage::new(100, 50);
/// assert_eq!(usage.total_tokens, 150);
/// assert!(usage.is_consistent());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    /// Prompt tokens
    #[serde(default)]
    pub input_tokens: u64,
    /// Completion tokens
    #[serde(default)]
    pub output_tokens: u64,
    /// Total as reported by the provider
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_input_tokens: Option<u64>,
}

impl TokenUsage {
    /// Usage with the total derived from input and output
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            reasoning_tokens: None,
            cached_input_tokens: None,
        }
    }

    /// Whether the reported total agrees with its parts.
    ///
    /// Providers differ on whether reasoning tokens are folded into the
    /// total, so both forms are accepted. Nothing rejects inconsistent
    /// records; this exists for diagnostics.
    pub fn is_consistent(&self) -> bool {
        let base = self.input_tokens + self.output_tokens;
        self.total_tokens == base || self.total_tokens == base + self.reasoning_tokens.unwrap_or(0)
    }
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let sum_opt = |a: Option<u64>, b: Option<u64>| match (a, b) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
        };
        Self {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            total_tokens: self.total_tokens + other.total_tokens,
            reasoning_tokens: sum_opt(self.reasoning_tokens, other.reasoning_tokens),
            cached_input_tokens: sum_opt(self.cached_input_tokens, other.cached_input_tokens),
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Warning attached to a log, either a bare string or a typed object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogWarning {
    Text(String),
    Structured {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl fmt::Display for LogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Structured {
                kind,
                message: Some(message),
            } => write!(f, "{kind}: {message}"),
            Self::Structured { kind, message: None } => f.write_str(kind),
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub tool_name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// A file sent along with the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub name: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Where a cached response came from
///
/// A log is served either from the application's own response cache or from
/// the provider's prompt cache, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CacheHit {
    /// Served from the application-level response cache
    Application {
        hit: bool,
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cached_tokens: Option<u64>,
    },
    /// Served (at least partially) from the provider's prompt cache
    Provider {
        hit: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        provider: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cached_tokens: Option<u64>,
    },
}

impl CacheHit {
    /// Whether the cache actually served the request
    pub fn is_hit(&self) -> bool {
        match self {
            Self::Application { hit, .. } | Self::Provider { hit, .. } => *hit,
        }
    }

    /// Short name of the cache layer
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Application { .. } => "application",
            Self::Provider { .. } => "provider",
        }
    }

    /// Cache key, if one was recorded
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Application { key, .. } => Some(key),
            Self::Provider { key, .. } => key.as_deref(),
        }
    }

    /// Tokens served from cache
    pub fn cached_tokens(&self) -> Option<u64> {
        match self {
            Self::Application { cached_tokens, .. } | Self::Provider { cached_tokens, .. } => {
                *cached_tokens
            }
        }
    }
}

/// Request, session and feature identifiers recorded with a log
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<CacheHit>,
}

/// One logged AI model invocation
///
/// Records are produced by the request logger and are read-only here; the
/// only mutation this crate performs is deleting a record through a
/// [`LogSource`](crate::source::LogSource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLogRecord {
    pub id: LogId,
    pub created_at: ISOTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub model_id: String,
    pub provider: String,
    pub request_type: RequestType,
    pub success: bool,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub warnings: Vec<LogWarning>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
    #[serde(default)]
    pub metadata: LogMetadata,
}

impl UsageLogRecord {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn total_tokens(&self) -> u64 {
        self.usage.total_tokens
    }

    /// Whether any cache layer served this request
    pub fn is_cache_hit(&self) -> bool {
        self.metadata
            .cache_hit
            .as_ref()
            .is_some_and(CacheHit::is_hit)
    }

    /// Lower-cased text that free-text search runs against.
    ///
    /// Fields are joined with a space so a search term never matches across
    /// a field boundary.
    pub fn searchable_text(&self) -> String {
        [
            self.prompt.as_str(),
            self.response.as_deref().unwrap_or(""),
            self.model_id.as_str(),
            self.provider.as_str(),
            self.error_message.as_deref().unwrap_or(""),
        ]
        .join(" ")
        .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::LogBuilder;

    const SAMPLE: &str = r#"{
        "id": "log_1",
        "createdAt": "2024-03-10T12:00:00Z",
        "modelId": "gpt-4o",
        "provider": "openai",
        "requestType": "text-generation",
        "success": true,
        "prompt": "Summarize the quarterly report",
        "response": "Revenue grew",
        "usage": {"inputTokens": 120, "outputTokens": 30, "totalTokens": 150, "reasoningTokens": 0},
        "cost": 0.0042,
        "latencyMs": 812,
        "finishReason": "stop",
        "warnings": ["deprecated model", {"type": "unsupported-setting", "message": "seed"}],
        "toolCalls": [{"toolName": "search", "args": {"q": "report"}}],
        "metadata": {
            "requestId": "req_9",
            "cacheHit": {"source": "provider", "hit": true, "provider": "openai", "cachedTokens": 64}
        }
    }"#;

    #[test]
    fn test_deserialize_full_record() {
        let record: UsageLogRecord = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(record.id.as_str(), "log_1");
        assert_eq!(record.request_type, RequestType::TextGeneration);
        assert_eq!(record.finish_reason, Some(FinishReason::Stop));
        assert_eq!(record.usage.total_tokens, 150);
        assert_eq!(record.warnings.len(), 2);
        assert_eq!(record.warnings[1].to_string(), "unsupported-setting: seed");
        assert!(record.has_tool_calls());
        assert!(!record.has_files());
        assert!(record.is_cache_hit());

        let cache = record.metadata.cache_hit.as_ref().unwrap();
        assert_eq!(cache.source_name(), "provider");
        assert_eq!(cache.cached_tokens(), Some(64));
        assert_eq!(cache.key(), None);
    }

    #[test]
    fn test_minimal_record_defaults() {
        let json = r#"{
            "id": "log_2",
            "createdAt": "2024-03-10T12:00:00Z",
            "modelId": "text-embedding-3-small",
            "provider": "openai",
            "requestType": "embedding",
            "success": false,
            "errorMessage": "rate limited"
        }"#;
        let record: UsageLogRecord = serde_json::from_str(json).unwrap();
        assert!(record.warnings.is_empty());
        assert!(record.tool_calls.is_empty());
        assert_eq!(record.cost, 0.0);
        assert_eq!(record.metadata, LogMetadata::default());
        assert!(!record.is_cache_hit());
    }

    #[test]
    fn test_unknown_finish_reason_maps_to_other() {
        let reason: FinishReason = serde_json::from_str("\"recitation\"").unwrap();
        assert_eq!(reason, FinishReason::Other);
        assert_eq!(
            serde_json::to_string(&FinishReason::ContentFilter).unwrap(),
            "\"content-filter\""
        );
    }

    #[test]
    fn test_request_type_from_str() {
        assert_eq!(
            RequestType::from_str("object_generation").unwrap(),
            RequestType::ObjectGeneration
        );
        assert_eq!(RequestType::from_str("IMAGE").unwrap(), RequestType::ImageGeneration);
        assert!(RequestType::from_str("speech").is_err());
    }

    #[test]
    fn test_searchable_text_handles_missing_fields() {
        let mut record: UsageLogRecord = serde_json::from_str(SAMPLE).unwrap();
        record.response = None;
        record.error_message = None;
        let text = record.searchable_text();
        assert!(text.contains("summarize the quarterly report"));
        assert!(text.contains("gpt-4o"));
        assert!(!text.contains("revenue"));
    }

    #[test]
    fn test_token_usage_consistency() {
        let mut usage = TokenUsage::new(10, 5);
        assert!(usage.is_consistent());
        usage.reasoning_tokens = Some(7);
        usage.total_tokens = 22;
        assert!(usage.is_consistent());
        usage.total_tokens = 99;
        assert!(!usage.is_consistent());
    }

    #[test]
    fn test_token_usage_add() {
        let mut a = TokenUsage::new(10, 5);
        let mut b = TokenUsage::new(1, 1);
        b.cached_input_tokens = Some(4);
        a += b;
        assert_eq!(a.total_tokens, 17);
        assert_eq!(a.cached_input_tokens, Some(4));
        assert_eq!(a.reasoning_tokens, None);
    }

    #[test]
    fn test_cache_miss_is_not_a_hit() {
        let miss = LogBuilder::new("miss")
            .cache_hit(CacheHit::Provider {
                hit: false,
                key: None,
                provider: "anthropic".to_string(),
                cached_tokens: None,
            })
            .build();
        assert!(!miss.is_cache_hit());
        assert_eq!(
            miss.metadata.cache_hit.as_ref().map(CacheHit::source_name),
            Some("provider")
        );
    }

    #[test]
    fn test_application_cache_hit_roundtrip() {
        let hit = CacheHit::Application {
            hit: true,
            key: "sha256:abc".to_string(),
            provider: None,
            cached_tokens: Some(10),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["source"], "application");
        assert_eq!(json["cachedTokens"], 10);
        let back: CacheHit = serde_json::from_value(json).unwrap();
        assert_eq!(back, hit);
    }
}
