//! Log source trait
//!
//! A `LogSource` is wherever usage logs live: the hosted log store, a
//! directory of JSONL exports, or memory. The rest of the crate only ever
//! streams logs out of a source and asks it to delete one by id.

use crate::error::Result;
use crate::types::{LogId, UsageLogRecord};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::RwLock;

/// Boxed stream of logs as returned by [`LogSource::fetch_logs`]
pub type LogStream<'a> = Pin<Box<dyn Stream<Item = Result<UsageLogRecord>> + Send + 'a>>;

/// Trait for log stores.
///
/// Fetches resolve to data or an error; retrying is left to the caller.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Stream every log the source holds
    fn fetch_logs(&self) -> LogStream<'_>;

    /// Delete a single log. Returns `false` when no log had that id.
    async fn delete_log(&self, id: &LogId) -> Result<bool>;
}

/// Logs held in memory, in insertion order
#[derive(Debug, Default)]
pub struct MemorySource {
    logs: RwLock<Vec<UsageLogRecord>>,
}

impl MemorySource {
    pub fn new(logs: Vec<UsageLogRecord>) -> Self {
        Self {
            logs: RwLock::new(logs),
        }
    }

    pub fn len(&self) -> usize {
        self.logs.read().map(|logs| logs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<UsageLogRecord> {
        match self.logs.read() {
            Ok(logs) => logs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl LogSource for MemorySource {
    fn fetch_logs(&self) -> LogStream<'_> {
        let logs = self.snapshot();
        Box::pin(async_stream::stream! {
            for log in logs {
                yield Ok(log);
            }
        })
    }

    async fn delete_log(&self, id: &LogId) -> Result<bool> {
        let mut logs = match self.logs.write() {
            Ok(logs) => logs,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = logs.len();
        logs.retain(|log| &log.id != id);
        Ok(logs.len() != before)
    }
}
