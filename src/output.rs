/// CSV output for the combined subset table.

use crate::model::OutputError;
use crate::table::SubsetTable;
use std::path::{Path, PathBuf};

/// `<dir>/<sitename>_gee_subset.csv`
pub fn output_path(dir: &Path, sitename: &str) -> PathBuf {
    dir.join(format!("{}_gee_subset.csv", sitename))
}

/// Writes the table with a header row and no index column.
///
/// The parent directory must already exist. Returns the number of data rows
/// written.
pub fn write_csv(table: &SubsetTable, path: &Path) -> Result<usize, OutputError> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;

    Ok(table.len())
}
