use snafu::prelude::*;

use mbm_pipeline::DetailRecord;

use crate::pipeline::{MbmResult, WritingExportSnafu};

/// Column order of the CSV export.
pub const EXPORT_HEADER: [&str; 4] = ["Country", "Region", "mechanism_type", "mechanism_detail"];

/// Writes the filtered long records to a CSV file, one row per record.
pub fn write_filtered_csv(records: &[DetailRecord], path: &str) -> MbmResult<()> {
    let writer = csv::Writer::from_path(path).context(WritingExportSnafu { path })?;
    write_records(records, writer).context(WritingExportSnafu { path })
}

/// Renders the export in memory, for callers that hand the bytes elsewhere.
pub fn export_bytes(records: &[DetailRecord]) -> MbmResult<Vec<u8>> {
    let writer = csv::Writer::from_writer(Vec::new());
    let writer =
        write_records_keep(records, writer).context(WritingExportSnafu { path: "<memory>" })?;
    match writer.into_inner() {
        Ok(bytes) => Ok(bytes),
        Err(e) => whatever!("Could not flush the in-memory export: {}", e),
    }
}

fn write_records<W: std::io::Write>(
    records: &[DetailRecord],
    writer: csv::Writer<W>,
) -> Result<(), csv::Error> {
    let mut writer = write_records_keep(records, writer)?;
    writer.flush()?;
    Ok(())
}

fn write_records_keep<W: std::io::Write>(
    records: &[DetailRecord],
    mut writer: csv::Writer<W>,
) -> Result<csv::Writer<W>, csv::Error> {
    writer.write_record(EXPORT_HEADER)?;
    for r in records {
        writer.write_record([
            r.country.as_str(),
            r.region.as_str(),
            r.mechanism.as_str(),
            r.detail_text.as_str(),
        ])?;
    }
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbm_pipeline::MechanismLabel;

    #[test]
    fn export_round_trips_commas_and_quotes() {
        let records = vec![DetailRecord {
            country: "Chile".to_string(),
            region: "Americas".to_string(),
            mechanism: MechanismLabel::from_column("1. Carbon Tax"),
            detail_text: "levy on fuels, \"premium\" rate; pilot".to_string(),
            vcm_count: None,
        }];
        let bytes = export_bytes(&records).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let header: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(header, EXPORT_HEADER);
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "Chile");
        assert_eq!(rows[0][2], "Carbon Tax");
        assert_eq!(rows[0][3], "levy on fuels, \"premium\" rate; pilot");
    }

    #[test]
    fn empty_record_set_exports_only_the_header() {
        let bytes = export_bytes(&[]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), "Country,Region,mechanism_type,mechanism_detail");
    }
}
