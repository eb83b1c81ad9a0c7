//! Cached log queries
//!
//! The log viewer asks the same question many times while paging through
//! results. `LogQueryCache` remembers each filtered and sorted result set,
//! keyed by [`FilterCriteria::cache_key`], so that changing pages slices a
//! cached set instead of refetching from the source.
//!
//! Entries never expire on their own. Deleting a log through the cache
//! drops every entry; callers that know the source changed underneath can
//! call [`LogQueryCache::invalidate_all`]. A fetch that was in flight when
//! the cache was invalidated still returns its logs but is not stored.

use crate::error::{AilogsError, Result};
use crate::filters::FilterCriteria;
use crate::pagination::{Page, try_paginate};
use crate::sorting::sort_logs;
use crate::source::LogSource;
use crate::types::{LogId, UsageLogRecord};
use futures::TryStreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

type ResultSet = Arc<Vec<UsageLogRecord>>;

/// Result-set cache in front of a [`LogSource`]
pub struct LogQueryCache<S: LogSource> {
    source: Arc<S>,
    entries: RwLock<HashMap<String, ResultSet>>,
    /// Bumped on every invalidation
    generation: AtomicU64,
}

impl<S: LogSource> LogQueryCache<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Every log matching `criteria`, sorted by its sort directive when set.
    ///
    /// A failed fetch returns the error and leaves the cache as it was.
    pub async fn all(&self, criteria: &FilterCriteria) -> Result<ResultSet> {
        criteria.validate()?;
        let key = criteria.cache_key();

        if let Some(hit) = self.entries.read().await.get(&key) {
            debug!("Query cache hit ({} logs)", hit.len());
            return Ok(Arc::clone(hit));
        }

        let generation = self.generation.load(Ordering::Acquire);
        let mut logs: Vec<UsageLogRecord> = criteria
            .clone()
            .filter_stream(self.source.fetch_logs())
            .try_collect()
            .await?;
        if let Some(sort) = &criteria.sort {
            sort_logs(&mut logs, sort);
        }
        debug!("Query cache miss, fetched {} matching logs", logs.len());

        let logs = Arc::new(logs);
        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            entries.insert(key, Arc::clone(&logs));
        } else {
            debug!("Cache invalidated during fetch, not storing result");
        }
        Ok(logs)
    }

    /// One page of the logs matching `criteria`
    pub async fn query(
        &self,
        criteria: &FilterCriteria,
        page_size: usize,
        page: usize,
    ) -> Result<Page<UsageLogRecord>> {
        let logs = self.all(criteria).await?;
        try_paginate(&logs, page_size, page)
    }

    /// Forget the result set for `criteria`. Returns whether one was cached.
    pub async fn invalidate(&self, criteria: &FilterCriteria) -> bool {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.remove(&criteria.cache_key()).is_some()
    }

    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    /// Delete a log from the source, then drop every cached result set
    pub async fn delete_log(&self, id: &LogId) -> Result<()> {
        if !self.source.delete_log(id).await? {
            return Err(AilogsError::NotFound(id.clone()));
        }
        self.invalidate_all().await;
        Ok(())
    }

    /// Number of cached result sets
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
