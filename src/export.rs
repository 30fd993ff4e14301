//! CSV export of assembled report rows

use crate::error::Result;
use crate::types::ReportRow;
use std::path::Path;

/// Write report rows to a CSV file
///
/// The header row is derived from the [`ReportRow`] field names. Fields
/// containing separators, quotes, or newlines are quoted as needed. An
/// existing file at `path` is replaced.
///
/// When `rows` is empty nothing is touched on disk; the return value says
/// whether a file was produced.
///
/// # Errors
///
/// Returns [`Error::Csv`](crate::error::Error::Csv) when the file cannot
/// be created or a row fails to serialize, and
/// [`Error::Io`](crate::error::Error::Io) when flushing fails.
pub fn write_report(rows: &[ReportRow], path: &Path) -> Result<bool> {
    if rows.is_empty() {
        tracing::info!("No data to write to CSV");
        return Ok(false);
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!(
        path = %path.display(),
        rows = rows.len(),
        "Data successfully written to CSV"
    );
    Ok(true)
}
