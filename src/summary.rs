//! Shape summary for staged CSV files.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::FetchError;

/// Header and record count of one CSV file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CsvSummary {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub records: u64,
}

impl fmt::Display for CsvSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        write!(
            f,
            "{}: {} record(s), {} column(s)",
            name,
            self.records,
            self.columns.len()
        )
    }
}

/// Read the header row and count data records.
///
/// Rows with a different field count than the header are counted, not
/// rejected; raw dumps often carry ragged trailing rows.
pub fn summarize_csv(path: &Path) -> Result<CsvSummary, FetchError> {
    let file = File::open(path).map_err(FetchError::Io)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));

    let csv_error = |source| FetchError::CsvSummary {
        path: path.to_path_buf(),
        source,
    };

    let columns = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut record = csv::ByteRecord::new();
    let mut records = 0u64;
    while reader.read_byte_record(&mut record).map_err(csv_error)? {
        records += 1;
    }

    Ok(CsvSummary {
        path: path.to_path_buf(),
        columns,
        records,
    })
}
