//! CSV and JSON export of AI usage logs
//!
//! An export is a one-shot operation: every log is fetched from the source,
//! filtered and sorted like the log viewer would, flattened, and serialized
//! in memory. Nothing touches disk until serialization has succeeded, and
//! [`ExportArtifact::write_to_dir`] persists the file atomically, so a failed
//! export never leaves a partial file behind.
//!
//! # Examples
//!
//! ```no_run
//! use ailogs_core::filters::FilterCriteria;
//! use ailogs_core::source::MemorySource;
//! use ailogs_export::{ExportFormat, ExportOptions, export_logs};
//!
//! # async fn example() -> ailogs_core::Result<()> {
//! let source = MemorySource::new(Vec::new());
//! let options = ExportOptions::new(ExportFormat::Csv).with_criteria(FilterCriteria::new());
//! let artifact = export_logs(&source, &options, chrono::Utc::now().date_naive()).await?;
//! artifact.write_to_dir(std::path::Path::new("."))?;
//! # Ok(())
//! # }
//! ```

pub mod fields;
pub mod record;
pub mod serialize;

use ailogs_core::error::{AilogsError, Result};
use ailogs_core::filters::{FilterCriteria, filter_logs};
use ailogs_core::sorting::sort_logs;
use ailogs_core::source::LogSource;
use chrono::NaiveDate;
use futures::StreamExt;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

pub use fields::{ExportField, ExportValue, dedupe_fields, default_export_fields};
pub use record::{FlatExportRecord, format_for_export};
pub use serialize::{to_csv, to_json};

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid export format: {s}")),
        }
    }
}

/// `ai-logs-<date>.<ext>`
pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!("ai-logs-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// What to export and how
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Columns in output order
    pub fields: Vec<ExportField>,
    pub criteria: FilterCriteria,
}

impl ExportOptions {
    /// All logs with the default columns
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            fields: default_export_fields(),
            criteria: FilterCriteria::default(),
        }
    }

    /// Columns to write, in order. Repeated columns are kept once.
    pub fn with_fields(mut self, fields: Vec<ExportField>) -> Self {
        self.fields = dedupe_fields(fields);
        self
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }
}

/// A finished export, ready to be handed to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
    pub record_count: usize,
}

impl ExportArtifact {
    /// Atomically write the artifact into `dir`, returning the final path
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(&self.filename);
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(self.content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&target).map_err(|e| AilogsError::Io(e.error))?;
        debug!("Wrote {} bytes to {}", self.content.len(), target.display());
        Ok(target)
    }
}

/// Fetch, filter, sort and serialize logs in one go.
///
/// Errors from the source are returned as-is.
pub async fn export_logs<S>(
    source: &S,
    options: &ExportOptions,
    export_date: NaiveDate,
) -> Result<ExportArtifact>
where
    S: LogSource + ?Sized,
{
    if options.fields.is_empty() {
        return Err(AilogsError::validation("fields", "select at least one column"));
    }
    options.criteria.validate()?;

    let mut logs = Vec::new();
    let mut stream = source.fetch_logs();
    while let Some(log) = stream.next().await {
        logs.push(log?);
    }
    let fetched = logs.len();

    let mut logs = filter_logs(&logs, &options.criteria);
    if let Some(sort) = &options.criteria.sort {
        sort_logs(&mut logs, sort);
    }

    let records: Vec<FlatExportRecord> = logs.iter().map(format_for_export).collect();
    let content = match options.format {
        ExportFormat::Csv => to_csv(&records, &options.fields)?,
        ExportFormat::Json => to_json(&records, &options.fields)?,
    };

    info!(
        "Exported {} of {} logs as {}",
        records.len(),
        fetched,
        options.format
    );

    Ok(ExportArtifact {
        filename: export_filename(options.format, export_date),
        mime_type: options.format.mime_type(),
        content,
        record_count: records.len(),
    })
}
