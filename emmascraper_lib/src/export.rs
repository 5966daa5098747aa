//! CSV export of normalized datasets.

use std::io::Write;
use std::path::Path;

use crate::error::ScraperError;
use crate::model::Record;

/// Default issuer dataset file.
pub const DEFAULT_ISSUERS_FILE: &str = "db1.csv";
/// Default pricing dataset file.
pub const DEFAULT_PRICING_FILE: &str = "db2.csv";

/// Writes `records` to `path` and returns the number of data rows written.
///
/// An empty dataset is skipped: nothing is created at `path` and 0 is
/// returned.
pub fn write_dataset(path: &Path, records: &[Record]) -> Result<usize, ScraperError> {
    if records.is_empty() {
        tracing::warn!("Nothing to write to {} - skipping", path.display());
        return Ok(0);
    }
    let wtr = csv::Writer::from_path(path)?;
    let written = write_records(wtr, records)?;
    tracing::info!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}

/// Writes a header taken from the first record's keys, then one row per
/// record with values looked up by header key.
pub fn write_records<W: Write>(
    mut wtr: csv::Writer<W>,
    records: &[Record],
) -> Result<usize, ScraperError> {
    let Some(first) = records.first() else {
        return Ok(0);
    };
    let header: Vec<&str> = first.keys().collect();
    wtr.write_record(&header)?;
    for record in records {
        wtr.write_record(header.iter().map(|key| record.get(key).unwrap_or_default()))?;
    }
    wtr.flush()?;
    Ok(records.len())
}
