//! Common test utilities and helpers for ailogs tests
//!
//! Builders for usage logs and helpers that write them to temporary log
//! directories in the formats the data loader reads.

#![allow(dead_code)]

use ailogs::types::{
    CacheHit, FileAttachment, FinishReason, ISOTimestamp, LogId, LogMetadata, RequestType,
    TokenUsage, ToolCall, UsageLogRecord,
};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use std::path::Path;
use tempfile::TempDir;

// Global mutex to serialize environment variable modifications in tests
pub static ENV_MUTEX: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

/// Models used across tests, as (provider, model id)
pub const TEST_MODELS: &[(&str, &str)] = &[
    ("openai", "gpt-4o"),
    ("openai", "gpt-4o-mini"),
    ("anthropic", "claude-3-5-sonnet"),
    ("google", "gemini-1.5-pro"),
];

/// Builder for creating test UsageLogRecord instances
pub struct UsageLogBuilder {
    log: UsageLogRecord,
}

impl UsageLogBuilder {
    /// A successful text generation with a random id
    pub fn new() -> Self {
        let (provider, model_id) = TEST_MODELS[0];
        Self {
            log: UsageLogRecord {
                id: LogId::new(format!("log_{}", uuid::Uuid::new_v4().simple())),
                created_at: ISOTimestamp::new(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()),
                user_id: Some("user_1".to_string()),
                model_id: model_id.to_string(),
                provider: provider.to_string(),
                request_type: RequestType::TextGeneration,
                success: true,
                prompt: "Draft an onboarding checklist".to_string(),
                response: Some("1. Laptop 2. Accounts".to_string()),
                error_message: None,
                usage: TokenUsage::new(100, 50),
                cost: 0.01,
                latency_ms: 400,
                finish_reason: Some(FinishReason::Stop),
                warnings: Vec::new(),
                tool_calls: Vec::new(),
                files: Vec::new(),
                metadata: LogMetadata::default(),
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.log.id = LogId::new(id);
        self
    }

    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.log.created_at = ISOTimestamp::new(ts);
        self
    }

    pub fn model(mut self, provider: &str, model_id: &str) -> Self {
        self.log.provider = provider.to_string();
        self.log.model_id = model_id.to_string();
        self
    }

    pub fn request_type(mut self, request_type: RequestType) -> Self {
        self.log.request_type = request_type;
        self
    }

    pub fn prompt(mut self, prompt: &str) -> Self {
        self.log.prompt = prompt.to_string();
        self
    }

    pub fn failed(mut self, message: &str) -> Self {
        self.log.success = false;
        self.log.error_message = Some(message.to_string());
        self.log.response = None;
        self.log.finish_reason = Some(FinishReason::Error);
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.log.cost = cost;
        self
    }

    pub fn latency(mut self, latency_ms: u64) -> Self {
        self.log.latency_ms = latency_ms;
        self
    }

    pub fn tokens(mut self, input: u64, output: u64) -> Self {
        self.log.usage = TokenUsage::new(input, output);
        self
    }

    pub fn tool_call(mut self, name: &str) -> Self {
        self.log.tool_calls.push(ToolCall {
            tool_call_id: Some(format!("call_{}", self.log.tool_calls.len())),
            tool_name: name.to_string(),
            args: serde_json::json!({ "query": "x" }),
        });
        self
    }

    pub fn file(mut self, name: &str) -> Self {
        self.log.files.push(FileAttachment {
            name: name.to_string(),
            media_type: "application/pdf".to_string(),
            size_bytes: Some(1024),
        });
        self
    }

    pub fn cache_hit(mut self, key: &str) -> Self {
        self.log.metadata.cache_hit = Some(CacheHit::Application {
            hit: true,
            key: key.to_string(),
            provider: None,
            cached_tokens: Some(self.log.usage.input_tokens),
        });
        self
    }

    pub fn build(self) -> UsageLogRecord {
        self.log
    }
}

impl Default for UsageLogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A week of mixed traffic ending 2024-01-21
pub fn sample_week() -> Vec<UsageLogRecord> {
    let mut logs = Vec::new();
    for day in 15..=21 {
        for (i, (provider, model)) in TEST_MODELS.iter().enumerate() {
            let hour = 8 + i as u32 * 2;
            let mut builder = UsageLogBuilder::new()
                .id(&format!("log_{day}_{i}"))
                .at(Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap())
                .model(provider, model)
                .cost(0.01 * (i as f64 + 1.0))
                .latency(200 + 100 * i as u64)
                .tokens(100 * (i as u64 + 1), 20);
            if day % 3 == 0 && i == 1 {
                builder = builder.failed("rate limit exceeded");
            }
            if i == 2 {
                builder = builder.tool_call("search_candidates");
            }
            logs.push(builder.build());
        }
    }
    logs
}

/// Write logs as one JSONL file
pub fn write_jsonl(dir: &Path, name: &str, logs: &[UsageLogRecord]) {
    let content: String = logs
        .iter()
        .map(|log| serde_json::to_string(log).unwrap() + "\n")
        .collect();
    std::fs::write(dir.join(name), content).unwrap();
}

/// Write logs as one JSON array file
pub fn write_json_array(dir: &Path, name: &str, logs: &[UsageLogRecord]) {
    std::fs::write(dir.join(name), serde_json::to_string_pretty(logs).unwrap()).unwrap();
}

/// A temporary log directory holding `logs`, split across both file formats
pub fn log_dir_with(logs: &[UsageLogRecord]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mid = logs.len() / 2;
    write_jsonl(dir.path(), "recent.jsonl", &logs[..mid]);
    write_json_array(dir.path(), "archive.json", &logs[mid..]);
    dir
}
