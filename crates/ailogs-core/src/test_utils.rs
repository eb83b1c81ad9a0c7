//! Shared test utilities for unit tests
//!
//! Integration tests (in tests/) cannot see this module because it is
//! compiled only under `#[cfg(test)]`; they carry their own builder in
//! tests/common/mod.rs.

use crate::types::{
    CacheHit, FileAttachment, FinishReason, ISOTimestamp, LogId, LogMetadata, RequestType,
    TokenUsage, ToolCall, UsageLogRecord,
};
use chrono::{TimeZone, Utc};

/// Builder for `UsageLogRecord` fixtures
pub struct LogBuilder {
    record: UsageLogRecord,
}

impl LogBuilder {
    /// A successful text-generation log created at 2024-01-01 12:00 UTC
    pub fn new(id: &str) -> Self {
        Self {
            record: UsageLogRecord {
                id: LogId::new(id),
                created_at: ISOTimestamp::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
                user_id: None,
                model_id: "gpt-4o-mini".to_string(),
                provider: "openai".to_string(),
                request_type: RequestType::TextGeneration,
                success: true,
                prompt: "hello".to_string(),
                response: Some("hi there".to_string()),
                error_message: None,
                usage: TokenUsage::new(100, 50),
                cost: 0.01,
                latency_ms: 500,
                finish_reason: Some(FinishReason::Stop),
                warnings: Vec::new(),
                tool_calls: Vec::new(),
                files: Vec::new(),
                metadata: LogMetadata::default(),
            },
        }
    }

    pub fn at(mut self, year: i32, month: u32, day: u32, hour: u32) -> Self {
        self.record.created_at =
            ISOTimestamp::new(Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap());
        self
    }

    pub fn model(mut self, provider: &str, model_id: &str) -> Self {
        self.record.provider = provider.to_string();
        self.record.model_id = model_id.to_string();
        self
    }

    pub fn request_type(mut self, request_type: RequestType) -> Self {
        self.record.request_type = request_type;
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.record.prompt = prompt.to_string();
        self
    }

    pub fn response(mut self, response: Option<&str>) -> Self {
        self.record.response = response.map(str::to_string);
        self
    }

    pub fn failed(mut self, message: &str) -> Self {
        self.record.success = false;
        self.record.error_message = Some(message.to_string());
        self.record.finish_reason = Some(FinishReason::Error);
        self
    }

    pub fn finish_reason(mut self, reason: Option<FinishReason>) -> Self {
        self.record.finish_reason = reason;
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.record.user_id = Some(user_id.to_string());
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.record.cost = cost;
        self
    }

    pub fn latency(mut self, latency_ms: u64) -> Self {
        self.record.latency_ms = latency_ms;
        self
    }

    pub fn tokens(mut self, input: u64, output: u64) -> Self {
        self.record.usage = TokenUsage::new(input, output);
        self
    }

    pub fn tool_call(mut self, name: &str) -> Self {
        self.record.tool_calls.push(ToolCall {
            tool_call_id: None,
            tool_name: name.to_string(),
            args: serde_json::Value::Null,
        });
        self
    }

    pub fn file(mut self, name: &str) -> Self {
        self.record.files.push(FileAttachment {
            name: name.to_string(),
            media_type: "application/pdf".to_string(),
            size_bytes: None,
        });
        self
    }

    pub fn cache_hit(mut self, cache_hit: CacheHit) -> Self {
        self.record.metadata.cache_hit = Some(cache_hit);
        self
    }

    pub fn build(self) -> UsageLogRecord {
        self.record
    }
}
