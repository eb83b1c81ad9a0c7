//! Flattened export record
//!
//! Nested usage, metadata and cache-hit data is hoisted into top-level
//! scalars. Missing optional values become 0, "" or false so that every
//! export of the same logs is byte-for-byte identical.

use ailogs_core::types::UsageLogRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatExportRecord {
    pub id: String,
    /// RFC 3339, millisecond precision, UTC
    pub created_at: String,
    pub user_id: String,
    pub model_id: String,
    pub provider: String,
    pub request_type: String,
    pub success: bool,
    pub prompt: String,
    pub response: String,
    pub error_message: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub reasoning_tokens: u64,
    pub cached_input_tokens: u64,
    pub cost: f64,
    pub latency_ms: u64,
    pub finish_reason: String,
    pub warning_count: u64,
    pub tool_call_count: u64,
    pub file_count: u64,
    pub request_id: String,
    pub session_id: String,
    pub feature: String,
    pub cache_hit: bool,
    /// `application`, `provider`, or empty when no cache was consulted
    pub cache_source: String,
    pub cache_key: String,
}

/// Flatten a log for export
pub fn format_for_export(log: &UsageLogRecord) -> FlatExportRecord {
    let cache = log.metadata.cache_hit.as_ref();

    FlatExportRecord {
        id: log.id.to_string(),
        created_at: log.created_at.to_rfc3339(),
        user_id: log.user_id.clone().unwrap_or_default(),
        model_id: log.model_id.clone(),
        provider: log.provider.clone(),
        request_type: log.request_type.to_string(),
        success: log.success,
        prompt: log.prompt.clone(),
        response: log.response.clone().unwrap_or_default(),
        error_message: log.error_message.clone().unwrap_or_default(),
        input_tokens: log.usage.input_tokens,
        output_tokens: log.usage.output_tokens,
        total_tokens: log.usage.total_tokens,
        reasoning_tokens: log.usage.reasoning_tokens.unwrap_or(0),
        cached_input_tokens: log.usage.cached_input_tokens.unwrap_or(0),
        cost: log.cost,
        latency_ms: log.latency_ms,
        finish_reason: log
            .finish_reason
            .map(|reason| reason.to_string())
            .unwrap_or_default(),
        warning_count: log.warnings.len() as u64,
        tool_call_count: log.tool_calls.len() as u64,
        file_count: log.files.len() as u64,
        request_id: log.metadata.request_id.clone().unwrap_or_default(),
        session_id: log.metadata.session_id.clone().unwrap_or_default(),
        feature: log.metadata.feature.clone().unwrap_or_default(),
        cache_hit: cache.is_some_and(|c| c.is_hit()),
        cache_source: cache
            .map(|c| c.source_name().to_string())
            .unwrap_or_default(),
        cache_key: cache
            .and_then(|c| c.key())
            .map(str::to_string)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ailogs_core::types::{
        CacheHit, ISOTimestamp, LogId, LogMetadata, RequestType, TokenUsage,
    };
    use chrono::{TimeZone, Utc};

    fn bare_log() -> UsageLogRecord {
        UsageLogRecord {
            id: LogId::new("log_1"),
            created_at: ISOTimestamp::new(Utc.with_ymd_and_hms(2024, 2, 29, 8, 15, 0).unwrap()),
            user_id: None,
            model_id: "gemini-1.5-flash".to_string(),
            provider: "google".to_string(),
            request_type: RequestType::ObjectGeneration,
            success: false,
            prompt: "Extract fields".to_string(),
            response: None,
            error_message: None,
            usage: TokenUsage::new(40, 0),
            cost: 0.0,
            latency_ms: 75,
            finish_reason: None,
            warnings: Vec::new(),
            tool_calls: Vec::new(),
            files: Vec::new(),
            metadata: LogMetadata::default(),
        }
    }

    #[test]
    fn test_missing_optionals_become_defaults() {
        let flat = format_for_export(&bare_log());
        assert_eq!(flat.created_at, "2024-02-29T08:15:00.000Z");
        assert_eq!(flat.request_type, "object-generation");
        assert_eq!(flat.response, "");
        assert_eq!(flat.error_message, "");
        assert_eq!(flat.finish_reason, "");
        assert_eq!(flat.reasoning_tokens, 0);
        assert!(!flat.cache_hit);
        assert_eq!(flat.cache_source, "");

        let json = serde_json::to_value(&flat).unwrap();
        assert!(json.as_object().unwrap().values().all(|v| !v.is_null()));
    }

    #[test]
    fn test_cache_hit_is_flattened() {
        let mut log = bare_log();
        log.metadata.cache_hit = Some(CacheHit::Application {
            hit: true,
            key: "prompt:42".to_string(),
            provider: None,
            cached_tokens: None,
        });
        let flat = format_for_export(&log);
        assert!(flat.cache_hit);
        assert_eq!(flat.cache_source, "application");
        assert_eq!(flat.cache_key, "prompt:42");
    }
}
