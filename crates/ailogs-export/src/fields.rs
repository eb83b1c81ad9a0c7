//! Export columns
//!
//! Each [`ExportField`] names one column of an export and resolves to a typed
//! accessor on [`FlatExportRecord`] once, before any rows are written.
//! Unknown names survive as [`ExportField::Custom`]: their header is the raw
//! key and every cell is empty.

use crate::record::FlatExportRecord;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Reads one column out of a flattened record
pub type Accessor = fn(&FlatExportRecord) -> ExportValue;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Text(String),
    Integer(u64),
    Decimal(f64),
    Bool(bool),
    Null,
}

impl ExportValue {
    /// Cell text for CSV; `Null` becomes an empty string
    pub fn to_csv_cell(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Decimal(n) => Value::from(*n),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null => Value::Null,
        }
    }
}

impl fmt::Display for ExportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => Ok(()),
        }
    }
}

/// One exportable column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExportField {
    Id,
    CreatedAt,
    UserId,
    ModelId,
    Provider,
    RequestType,
    Success,
    Prompt,
    Response,
    ErrorMessage,
    InputTokens,
    OutputTokens,
    TotalTokens,
    ReasoningTokens,
    CachedInputTokens,
    Cost,
    LatencyMs,
    FinishReason,
    WarningCount,
    ToolCallCount,
    FileCount,
    RequestId,
    SessionId,
    Feature,
    CacheHit,
    CacheSource,
    CacheKey,
    /// A name with no known column
    Custom(String),
}

const KNOWN_FIELDS: &[(&str, ExportField)] = &[
    ("id", ExportField::Id),
    ("createdAt", ExportField::CreatedAt),
    ("userId", ExportField::UserId),
    ("modelId", ExportField::ModelId),
    ("provider", ExportField::Provider),
    ("requestType", ExportField::RequestType),
    ("success", ExportField::Success),
    ("prompt", ExportField::Prompt),
    ("response", ExportField::Response),
    ("errorMessage", ExportField::ErrorMessage),
    ("inputTokens", ExportField::InputTokens),
    ("outputTokens", ExportField::OutputTokens),
    ("totalTokens", ExportField::TotalTokens),
    ("reasoningTokens", ExportField::ReasoningTokens),
    ("cachedInputTokens", ExportField::CachedInputTokens),
    ("cost", ExportField::Cost),
    ("latencyMs", ExportField::LatencyMs),
    ("finishReason", ExportField::FinishReason),
    ("warningCount", ExportField::WarningCount),
    ("toolCallCount", ExportField::ToolCallCount),
    ("fileCount", ExportField::FileCount),
    ("requestId", ExportField::RequestId),
    ("sessionId", ExportField::SessionId),
    ("feature", ExportField::Feature),
    ("cacheHit", ExportField::CacheHit),
    ("cacheSource", ExportField::CacheSource),
    ("cacheKey", ExportField::CacheKey),
];

impl ExportField {
    /// Resolve a column name. Unknown names become `Custom`.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        KNOWN_FIELDS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, field)| field.clone())
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }

    /// Parse a comma separated list of column names, skipping blanks and
    /// repeats
    pub fn parse_list(list: &str) -> Vec<Self> {
        dedupe_fields(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(Self::parse),
        )
    }

    /// Key used for JSON objects
    pub fn key(&self) -> &str {
        match self {
            Self::Custom(name) => name.as_str(),
            known => KNOWN_FIELDS
                .iter()
                .find(|(_, field)| field == known)
                .map(|(key, _)| *key)
                .unwrap_or_default(),
        }
    }

    /// Human readable column label, for the columns that have one
    pub fn label(&self) -> Option<&'static str> {
        let label = match self {
            Self::Id => "ID",
            Self::CreatedAt => "Date",
            Self::UserId => "User",
            Self::ModelId => "Model",
            Self::Provider => "Provider",
            Self::RequestType => "Request Type",
            Self::Success => "Success",
            Self::Prompt => "Prompt",
            Self::Response => "Response",
            Self::ErrorMessage => "Error",
            Self::InputTokens => "Input Tokens",
            Self::OutputTokens => "Output Tokens",
            Self::TotalTokens => "Total Tokens",
            Self::ReasoningTokens => "Reasoning Tokens",
            Self::CachedInputTokens => "Cached Input Tokens",
            Self::Cost => "Cost (USD)",
            Self::LatencyMs => "Latency (ms)",
            Self::FinishReason => "Finish Reason",
            Self::WarningCount => "Warnings",
            Self::ToolCallCount => "Tool Calls",
            Self::CacheHit => "Cache Hit",
            Self::FileCount
            | Self::RequestId
            | Self::SessionId
            | Self::Feature
            | Self::CacheSource
            | Self::CacheKey
            | Self::Custom(_) => return None,
        };
        Some(label)
    }

    /// CSV header: the label, or the raw key for unlabelled columns
    pub fn header(&self) -> &str {
        match self.label() {
            Some(label) => label,
            None => self.key(),
        }
    }

    pub fn accessor(&self) -> Accessor {
        match self {
            Self::Id => |r| ExportValue::Text(r.id.clone()),
            Self::CreatedAt => |r| ExportValue::Text(r.created_at.clone()),
            Self::UserId => |r| ExportValue::Text(r.user_id.clone()),
            Self::ModelId => |r| ExportValue::Text(r.model_id.clone()),
            Self::Provider => |r| ExportValue::Text(r.provider.clone()),
            Self::RequestType => |r| ExportValue::Text(r.request_type.clone()),
            Self::Success => |r| ExportValue::Bool(r.success),
            Self::Prompt => |r| ExportValue::Text(r.prompt.clone()),
            Self::Response => |r| ExportValue::Text(r.response.clone()),
            Self::ErrorMessage => |r| ExportValue::Text(r.error_message.clone()),
            Self::InputTokens => |r| ExportValue::Integer(r.input_tokens),
            Self::OutputTokens => |r| ExportValue::Integer(r.output_tokens),
            Self::TotalTokens => |r| ExportValue::Integer(r.total_tokens),
            Self::ReasoningTokens => |r| ExportValue::Integer(r.reasoning_tokens),
            Self::CachedInputTokens => |r| ExportValue::Integer(r.cached_input_tokens),
            Self::Cost => |r| ExportValue::Decimal(r.cost),
            Self::LatencyMs => |r| ExportValue::Integer(r.latency_ms),
            Self::FinishReason => |r| ExportValue::Text(r.finish_reason.clone()),
            Self::WarningCount => |r| ExportValue::Integer(r.warning_count),
            Self::ToolCallCount => |r| ExportValue::Integer(r.tool_call_count),
            Self::FileCount => |r| ExportValue::Integer(r.file_count),
            Self::RequestId => |r| ExportValue::Text(r.request_id.clone()),
            Self::SessionId => |r| ExportValue::Text(r.session_id.clone()),
            Self::Feature => |r| ExportValue::Text(r.feature.clone()),
            Self::CacheHit => |r| ExportValue::Bool(r.cache_hit),
            Self::CacheSource => |r| ExportValue::Text(r.cache_source.clone()),
            Self::CacheKey => |r| ExportValue::Text(r.cache_key.clone()),
            Self::Custom(_) => |_| ExportValue::Null,
        }
    }
}

impl fmt::Display for ExportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Columns exported when the caller does not pick any
pub fn default_export_fields() -> Vec<ExportField> {
    vec![
        ExportField::Id,
        ExportField::CreatedAt,
        ExportField::Provider,
        ExportField::ModelId,
        ExportField::RequestType,
        ExportField::Success,
        ExportField::InputTokens,
        ExportField::OutputTokens,
        ExportField::TotalTokens,
        ExportField::Cost,
        ExportField::LatencyMs,
        ExportField::FinishReason,
        ExportField::CacheHit,
        ExportField::ErrorMessage,
    ]
}

/// Drop later columns whose key repeats an earlier one
pub fn dedupe_fields(fields: impl IntoIterator<Item = ExportField>) -> Vec<ExportField> {
    let mut seen = HashSet::new();
    fields
        .into_iter()
        .filter(|field| seen.insert(field.key().to_string()))
        .collect()
}
