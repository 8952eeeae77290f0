//! Delimited export of finished tables.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tabmap_model::Table;

use crate::error::Result;

/// Writes `table` as CSV: a header row, then one record per row.
///
/// Empty cells are written as empty fields.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    if table.column_count() == 0 {
        out.flush()?;
        return Ok(());
    }
    out.write_record(table.columns().iter().map(|c| c.name.as_str()))?;
    for idx in 0..table.row_count() {
        out.write_record(table.columns().iter().map(|c| c.values[idx].render()))?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv_path(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file)?;
    tracing::debug!(path = %path.display(), rows = table.row_count(), "table written");
    Ok(())
}

/// Renders `table` as a CSV string.
pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
