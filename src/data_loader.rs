//! File-backed log source
//!
//! Reads usage logs from a directory tree of `*.jsonl` files (one log per
//! line) and `*.json` files (an array of logs). The directory defaults to
//! `<data dir>/ailogs/logs` and can be overridden with `AILOGS_DATA_DIR`.
//!
//! Files are read in path order and a log id seen in an earlier file wins;
//! later copies are dropped.
//!
//! # Examples
//!
//! ```no_run
//! use ailogs::data_loader::DataLoader;
//! use ailogs::source::LogSource;
//! use futures::StreamExt;
//!
//! # async fn example() -> ailogs::Result<()> {
//! let loader = DataLoader::new(None)?;
//! let mut logs = loader.fetch_logs();
//! while let Some(log) = logs.next().await {
//!     let log = log?;
//!     println!("{} {} ${:.4}", log.id, log.model_id, log.cost);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{AilogsError, Result};
use crate::source::{LogSource, LogStream};
use crate::types::{LogId, UsageLogRecord};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// Environment variable overriding the log directory
pub const DATA_DIR_ENV: &str = "AILOGS_DATA_DIR";

/// Data loader for usage logs stored on disk
pub struct DataLoader {
    logs_dir: PathBuf,
    show_progress: bool,
}

/// Just enough of a log to find it by id
#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFileKind {
    Lines,
    Array,
}

impl LogFileKind {
    fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("jsonl") => Some(Self::Lines),
            Some("json") => Some(Self::Array),
            _ => None,
        }
    }
}

impl DataLoader {
    /// Create a loader for `logs_dir`, or for the default directory when
    /// `None`
    pub fn new(logs_dir: Option<PathBuf>) -> Result<Self> {
        let logs_dir = match logs_dir {
            Some(dir) => dir,
            None => Self::default_logs_dir()?,
        };

        if !logs_dir.exists() {
            debug!("Log directory not found: {}", logs_dir.display());
        }

        Ok(Self {
            logs_dir,
            show_progress: false,
        })
    }

    /// Resolve the log directory from the environment or the platform data
    /// directory
    pub fn default_logs_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        dirs::data_dir()
            .map(|dir| dir.join("ailogs").join("logs"))
            .ok_or_else(|| AilogsError::Config("Cannot determine data directory".into()))
    }

    /// Show a progress bar while files are read
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// All log files under the directory, in path order
    pub fn find_log_files(&self) -> Vec<PathBuf> {
        if !self.logs_dir.exists() {
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.logs_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| LogFileKind::of(path).is_some())
            .collect();
        files.sort();
        files
    }

    fn progress_bar(&self, files: usize) -> Option<ProgressBar> {
        if !self.show_progress || files == 0 {
            return None;
        }
        let pb = ProgressBar::new(files as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Loading usage logs");
        Some(pb)
    }
}

/// Parse one log file. Bad lines and array entries are skipped with a
/// warning; a `.json` file that is not an array at all is an error.
pub async fn parse_log_file(path: &Path) -> Result<Vec<UsageLogRecord>> {
    let content = tokio::fs::read_to_string(path).await?;

    let logs = match LogFileKind::of(path) {
        Some(LogFileKind::Array) => {
            let entries: Vec<serde_json::Value> = serde_json::from_str(&content)?;
            let mut logs = Vec::with_capacity(entries.len());
            for (index, entry) in entries.into_iter().enumerate() {
                match serde_json::from_value::<UsageLogRecord>(entry) {
                    Ok(log) => logs.push(log),
                    Err(e) => warn!("Skipping {}[{}]: {}", path.display(), index, e),
                }
            }
            logs
        }
        Some(LogFileKind::Lines) => {
            let mut logs = Vec::new();
            for (line_no, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<UsageLogRecord>(line) {
                    Ok(log) => logs.push(log),
                    Err(e) => warn!(
                        "Skipping {}:{}: {}",
                        path.display(),
                        line_no + 1,
                        e
                    ),
                }
            }
            logs
        }
        None => Vec::new(),
    };

    for log in &logs {
        if !log.usage.is_consistent() {
            debug!(
                "Log {} reports {} total tokens for {} input + {} output",
                log.id, log.usage.total_tokens, log.usage.input_tokens, log.usage.output_tokens
            );
        }
    }

    Ok(logs)
}

/// Rewrite `content` without the log `id`. `None` when the id is absent.
fn remove_from_content(kind: LogFileKind, content: &str, id: &LogId) -> Result<Option<String>> {
    match kind {
        LogFileKind::Lines => {
            let mut found = false;
            let mut kept = String::with_capacity(content.len());
            for line in content.lines() {
                let is_target = serde_json::from_str::<IdOnly>(line)
                    .is_ok_and(|entry| entry.id == id.as_str());
                if is_target {
                    found = true;
                } else {
                    kept.push_str(line);
                    kept.push('\n');
                }
            }
            Ok(found.then_some(kept))
        }
        LogFileKind::Array => {
            let mut entries: Vec<serde_json::Value> = serde_json::from_str(content)?;
            let before = entries.len();
            entries.retain(|entry| entry.get("id").and_then(|v| v.as_str()) != Some(id.as_str()));
            if entries.len() == before {
                return Ok(None);
            }
            Ok(Some(serde_json::to_string_pretty(&entries)?))
        }
    }
}

fn replace_file(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| AilogsError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl LogSource for DataLoader {
    fn fetch_logs(&self) -> LogStream<'_> {
        Box::pin(async_stream::try_stream! {
            let files = self.find_log_files();
            debug!("Found {} log files in {}", files.len(), self.logs_dir.display());

            let progress = self.progress_bar(files.len());
            let mut seen: HashSet<LogId> = HashSet::new();
            for path in files {
                match parse_log_file(&path).await {
                    Ok(logs) => {
                        for log in logs {
                            if !seen.insert(log.id.clone()) {
                                trace!("Skipping duplicate log {} in {}", log.id, path.display());
                                continue;
                            }
                            yield log;
                        }
                    }
                    Err(e) => warn!("Failed to read {}: {}", path.display(), e),
                }
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
            }
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
        })
    }

    async fn delete_log(&self, id: &LogId) -> Result<bool> {
        for path in self.find_log_files() {
            let Some(kind) = LogFileKind::of(&path) else {
                continue;
            };
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable {}: {}", path.display(), e);
                    continue;
                }
            };
            if !content.contains(id.as_str()) {
                continue;
            }
            match remove_from_content(kind, &content, id) {
                Ok(Some(rewritten)) => {
                    replace_file(&path, &rewritten)?;
                    info!("Deleted log {} from {}", id, path.display());
                    return Ok(true);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable {}: {}", path.display(), e),
            }
        }
        Ok(false)
    }
}
