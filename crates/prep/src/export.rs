//! Prepped-table CSV export

use std::path::Path;

use tracing::info;

use crate::errors::{PrepError, Result};
use crate::table::Table;

/// Write `table` as CSV with the index column first.
pub fn write_csv<W: std::io::Write>(table: &Table, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = Vec::with_capacity(table.width() + 1);
    header.push(table.index_name().to_string());
    header.extend(table.column_names().iter().cloned());
    writer.write_record(&header).map_err(write_error)?;

    let columns: Vec<_> = table.columns().map(|(_, c)| c).collect();
    for (row, id) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(id.to_string());
        record.extend(columns.iter().map(|c| c.value(row).to_string()));
        writer.write_record(&record).map_err(write_error)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_error(err: csv::Error) -> PrepError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => PrepError::Io(io),
        other => PrepError::Serialization(format!("csv export: {:?}", other)),
    }
}

/// Write `table` to a CSV file, creating parent directories.
pub fn export_csv(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(table, std::io::BufWriter::new(file))?;
    info!("Wrote prepped table to {}", path.display());
    Ok(())
}
