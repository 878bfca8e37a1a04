//! CSV file generation for exports.

use std::io;
use std::path::{Path, PathBuf};

use crate::dto::export::ExportTable;
use crate::endpoints::ExportSink;
use crate::endpoints::errors::{EndpointError, EndpointResult};

/// Writes `table` as CSV with a header row.
pub fn write_csv<W: io::Write>(table: &ExportTable, writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Export sink producing a CSV file at a fixed path.
#[derive(Debug, Clone)]
pub struct CsvExportSink {
    path: PathBuf,
}

impl CsvExportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for CsvExportSink {
    fn write_table(&self, table: &ExportTable) -> EndpointResult<()> {
        let file = std::fs::File::create(&self.path).map_err(|err| {
            EndpointError::Sink(format!("cannot create {}: {err}", self.path.display()))
        })?;
        write_csv(table, file).map_err(|err| {
            EndpointError::Sink(format!("cannot write {}: {err}", self.path.display()))
        })?;
        log::info!(
            "Exported {} rows to {}",
            table.rows.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_quoted_rows() {
        let table = ExportTable {
            headers: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec!["1".to_string(), "Lee, Ann".to_string()],
                vec!["2".to_string(), "Bob".to_string()],
            ],
        };

        let mut buffer = Vec::new();
        write_csv(&table, &mut buffer).expect("csv written");

        assert_eq!(
            String::from_utf8(buffer).expect("utf-8"),
            "id,name\n1,\"Lee, Ann\"\n2,Bob\n"
        );
    }
}
