//! CSV and JSON serialization of flattened records

use crate::fields::{Accessor, ExportField};
use crate::record::FlatExportRecord;
use ailogs_core::error::{AilogsError, Result};
use serde_json::{Map, Value};

/// Serialize records as CSV.
///
/// The header row uses each field's label. Cells containing a comma, a
/// double quote or a line break are quoted with inner quotes doubled.
pub fn to_csv(records: &[FlatExportRecord], fields: &[ExportField]) -> Result<String> {
    let accessors: Vec<Accessor> = fields.iter().map(ExportField::accessor).collect();

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(fields.iter().map(ExportField::header))
        .map_err(|e| AilogsError::Export(e.to_string()))?;

    for record in records {
        writer
            .write_record(accessors.iter().map(|read| read(record).to_csv_cell()))
            .map_err(|e| AilogsError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AilogsError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AilogsError::Export(e.to_string()))
}

/// Serialize records as a pretty-printed JSON array.
///
/// Each object holds exactly the requested keys, in the requested order.
pub fn to_json(records: &[FlatExportRecord], fields: &[ExportField]) -> Result<String> {
    let columns: Vec<(String, Accessor)> = fields
        .iter()
        .map(|field| (field.key().to_string(), field.accessor()))
        .collect();

    let rows: Vec<Value> = records
        .iter()
        .map(|record| {
            let object: Map<String, Value> = columns
                .iter()
                .map(|(key, read)| (key.clone(), read(record).to_json()))
                .collect();
            Value::Object(object)
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}
