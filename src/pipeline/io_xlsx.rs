use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use log::warn;
use snafu::prelude::*;

use mbm_pipeline::RawTable;

use crate::pipeline::{
    EmptyTableSnafu, EmptyWorkbookSnafu, MbmResult, MissingWorksheetSnafu, OpeningWorkbookSnafu,
};

/// Reads one worksheet of an Excel workbook as a raw table. The first row is
/// the header.
pub fn read_xlsx_table(path: &str, worksheet_name: Option<&str>) -> MbmResult<RawTable> {
    let range = get_range(path, worksheet_name)?;
    let mut raw_rows = range.rows();
    let header = raw_rows
        .next()
        .context(EmptyTableSnafu { path })?
        .iter()
        .map(|cell| cell_to_text(cell).trim().to_string())
        .collect();
    let rows = raw_rows
        .map(|row| row.iter().map(cell_to_text).collect())
        .collect();
    Ok(RawTable {
        columns: header,
        rows,
    })
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> MbmResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningWorkbookSnafu { path })?;
    match worksheet_name {
        Some(name) => {
            let range = workbook
                .worksheet_range(name)
                .context(MissingWorksheetSnafu { name, path })?
                .context(OpeningWorkbookSnafu { path })?;
            Ok(range)
        }
        None => {
            let sheets = workbook.worksheets();
            match &sheets[..] {
                [] => EmptyWorkbookSnafu { path }.fail(),
                [(_, range)] => Ok(range.clone()),
                l => {
                    let names: Vec<&str> = l.iter().map(|(name, _)| name.as_str()).collect();
                    whatever!(
                        "The workbook {} has several worksheets ({:?}). Use --excel-worksheet-name to pick one.",
                        path,
                        names
                    )
                }
            }
        }
    }
}

// Numbers are rendered without a trailing ".0" so that cell text compares
// equal between Excel and CSV sources.
fn cell_to_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => format!("{}", f),
        DataType::Int(i) => format!("{}", i),
        DataType::Bool(b) => format!("{}", b),
        DataType::Empty => String::new(),
        x => {
            warn!("Unexpected cell content, treated as empty: {:?}", x);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::cell_to_text;
    use calamine::DataType;

    #[test]
    fn whole_floats_render_without_a_decimal_part() {
        assert_eq!(cell_to_text(&DataType::Float(12.0)), "12");
        assert_eq!(cell_to_text(&DataType::Float(12.5)), "12.5");
        assert_eq!(cell_to_text(&DataType::Int(3)), "3");
        assert_eq!(cell_to_text(&DataType::Empty), "");
    }
}
