use snafu::prelude::*;

use mbm_pipeline::RawTable;

use crate::pipeline::{EmptyTableSnafu, MbmResult, OpeningCsvSnafu};

/// Reads a CSV file as a raw table. The first row is the header; rows with a
/// different number of fields are accepted and padded on access.
pub fn read_csv_table(path: &str) -> MbmResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;

    let mut columns: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.context(OpeningCsvSnafu { path })?;
        let cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        match columns {
            None => {
                columns = Some(cells.iter().map(|s| s.trim().to_string()).collect());
            }
            Some(_) => rows.push(cells),
        }
    }
    let columns = columns.context(EmptyTableSnafu { path })?;
    Ok(RawTable { columns, rows })
}
