use log::{info, warn};

use mbm_pipeline::*;
use snafu::{prelude::*, Snafu};

use std::collections::{HashMap, HashSet};
use std::fs;

use serde::Serialize;
use text_diff::print_diff;

use crate::args::Args;

pub mod export;
pub mod io_csv;
pub mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum MbmError {
    #[snafu(display("Source data unavailable: could not open workbook {path}"))]
    OpeningWorkbook {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Source data unavailable: no usable worksheet in {path}"))]
    EmptyWorkbook { path: String },
    #[snafu(display("Source data unavailable: worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Source data unavailable: {path} has no header row"))]
    EmptyTable { path: String },
    #[snafu(display("Source data unavailable: could not read {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Source data unavailable: missing required column {name}"))]
    MissingColumn { name: String },
    #[snafu(display("Could not write the export file {path}"))]
    WritingExport { source: csv::Error, path: String },
    #[snafu(display("Could not open the reference summary {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Could not serialize the summary document"))]
    ParsingSummary { source: serde_json::Error },
    #[snafu(display("Could not write the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MbmResult<T> = Result<T, MbmError>;

/// Input provider options.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct LoadOptions {
    pub input_type: Option<String>,
    pub worksheet_name: Option<String>,
}

/// Caches the raw load per source path. The spreadsheet is treated as
/// immutable for the session and may be consulted on every interaction, so it
/// is read at most once per path.
#[derive(Default)]
pub struct SourceCache {
    tables: HashMap<String, RawTable>,
}

impl SourceCache {
    pub fn new() -> SourceCache {
        SourceCache::default()
    }

    pub fn load(&mut self, path: &str, options: &LoadOptions) -> MbmResult<&RawTable> {
        if !self.tables.contains_key(path) {
            let table = load_raw(path, options)?;
            info!(
                "load: {}: {} columns, {} rows",
                path,
                table.columns.len(),
                table.rows.len()
            );
            self.tables.insert(path.to_string(), table);
        }
        Ok(&self.tables[path])
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

/// Reads the source table, dispatching on the declared or inferred provider.
pub fn load_raw(path: &str, options: &LoadOptions) -> MbmResult<RawTable> {
    let provider = match options.input_type.as_deref() {
        Some(x) => x.to_string(),
        None if path.to_lowercase().ends_with(".csv") => "csv".to_string(),
        None => "xlsx".to_string(),
    };
    info!("load_raw: reading {} as {}", path, provider);
    match provider.as_str() {
        "xlsx" => io_xlsx::read_xlsx_table(path, options.worksheet_name.as_deref()),
        "csv" => io_csv::read_csv_table(path),
        x => whatever!("Input type not implemented: {:?}", x),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterDoc {
    pub regions: Vec<String>,
    pub mechanism_types: Vec<String>,
    pub countries: Vec<String>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub countries_covered: usize,
    pub countries_in_view: usize,
    pub mechanism_types_in_view: usize,
    pub vcm_projects_sum: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountryDoc {
    pub country: String,
    pub region: String,
    pub iso3: Option<String>,
    pub mechanism_type_count: usize,
    pub vcm_projects_sum: i64,
    pub mechanism_types: Vec<String>,
    pub details: Vec<String>,
}

/// The summary document written by the binary: the filters in effect, the
/// headline numbers and one entry per country in view.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryDoc {
    pub source: String,
    pub filters: FilterDoc,
    pub kpis: Kpis,
    pub unresolved_territories: Vec<String>,
    pub countries: Vec<CountryDoc>,
}

pub fn build_summary_doc(
    source: &str,
    filter: &Filter,
    summaries: &[CountrySummary],
    filtered: &[DetailRecord],
    countries_covered: usize,
) -> SummaryDoc {
    let types_in_view: HashSet<&str> = filtered.iter().map(|r| r.mechanism.as_str()).collect();
    let vcm_sum: i64 = summaries.iter().map(|s| s.vcm_projects_sum()).sum();
    let unresolved: Vec<String> = summaries
        .iter()
        .filter(|s| s.iso3.is_none())
        .map(|s| s.country.clone())
        .collect();

    SummaryDoc {
        source: source.to_string(),
        filters: FilterDoc {
            regions: filter.regions.clone(),
            mechanism_types: filter.mechanisms.clone(),
            countries: filter.countries.clone(),
            keyword: filter.keyword.clone(),
        },
        kpis: Kpis {
            countries_covered,
            countries_in_view: summaries.len(),
            mechanism_types_in_view: types_in_view.len(),
            vcm_projects_sum: vcm_sum,
        },
        unresolved_territories: unresolved,
        countries: summaries
            .iter()
            .map(|s| CountryDoc {
                country: s.country.clone(),
                region: s.region.clone(),
                iso3: s.iso3.map(|c| c.to_string()),
                mechanism_type_count: s.mechanism_type_count,
                vcm_projects_sum: s.vcm_projects_sum(),
                mechanism_types: s.numbered_types(),
                details: s.detail_lines(),
            })
            .collect(),
    }
}

/// One full pass: load (cached), reshape, filter, summarize, then write the
/// requested outputs.
pub fn run_pipeline(args: &Args) -> MbmResult<()> {
    let options = LoadOptions {
        input_type: args.input_type.clone(),
        worksheet_name: args.excel_worksheet_name.clone(),
    };
    let mut cache = SourceCache::new();
    let raw = cache.load(&args.input, &options)?;

    let (wide, records) = match reshape(raw) {
        Ok(x) => x,
        Err(PipelineErrors::MissingCountryColumn) => {
            return MissingColumnSnafu { name: COL_COUNTRY }.fail();
        }
    };
    let base_all = wide.base_countries();

    let filter = args.filter();
    info!("filters: {:?}", filter);
    let filtered = apply_filter(&records, &filter);
    let base_view = filter_base(&base_all, &filter);
    let summaries = summarize(&filtered, &base_view);

    // Advisory for territories the map cannot place. They stay in the
    // summaries and in the export.
    let unresolved: Vec<&str> = base_view
        .iter()
        .filter(|b| b.iso3.is_none())
        .map(|b| b.country.as_str())
        .collect();
    if !unresolved.is_empty() {
        let examples: Vec<&str> = unresolved.iter().take(10).copied().collect();
        warn!(
            "ISO3 not found for {} countries/territories (not shown on map). Examples: {}",
            unresolved.len(),
            examples.join(", ")
        );
    }

    let doc = build_summary_doc(&args.input, &filter, &summaries, &filtered, base_all.len());
    info!(
        "KPIs: {} countries covered, {} in view, {} mechanism types in view, {} VCM projects",
        doc.kpis.countries_covered,
        doc.kpis.countries_in_view,
        doc.kpis.mechanism_types_in_view,
        doc.kpis.vcm_projects_sum
    );

    let pretty = serde_json::to_string_pretty(&doc).context(ParsingSummarySnafu {})?;
    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty),
        Some(p) => fs::write(p, &pretty).context(WritingSummarySnafu { path: p })?,
    }

    if let Some(export_path) = args.export.as_deref() {
        export::write_filtered_csv(&filtered, export_path)?;
        info!(
            "export: wrote {} records to {}",
            filtered.len(),
            export_path
        );
    }

    if let Some(reference_path) = args.reference.as_deref() {
        check_reference(reference_path, &pretty)?;
    }
    Ok(())
}

// The reference summary, if provided for comparison.
fn check_reference(path: &str, pretty_summary: &str) -> MbmResult<()> {
    let contents = fs::read_to_string(path).context(OpeningReferenceSnafu { path })?;
    let reference: serde_json::Value =
        serde_json::from_str(&contents).context(ParsingSummarySnafu {})?;
    let pretty_reference =
        serde_json::to_string_pretty(&reference).context(ParsingSummarySnafu {})?;
    if pretty_reference != pretty_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), pretty_summary, "\n");
        whatever!("Difference detected between computed summary and reference summary");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(name: &str, content: &str) -> String {
        let mut path = std::env::temp_dir();
        path.push(format!("mbmdata_test_{}_{}", std::process::id(), name));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn loads_and_reshapes_a_csv_source() {
        let path = write_fixture(
            "basic.csv",
            "No,Country ,Region,1. Carbon Tax,5. VCM project\n\
             1,Indonesia,Asia,Carbon tax on coal,12\n\
             2,Fiji,Oceania,,abc\n",
        );
        let mut cache = SourceCache::new();
        let raw = cache.load(&path, &LoadOptions::default()).unwrap().clone();
        assert_eq!(raw.columns[1], "Country");
        // The cache serves the same table on the second call.
        assert_eq!(cache.load(&path, &LoadOptions::default()).unwrap(), &raw);

        let (wide, records) = reshape(&raw).unwrap();
        assert_eq!(wide.rows.len(), 2);
        assert_eq!(records.len(), 3);

        let summaries = summarize(&records, &wide.base_countries());
        let doc = build_summary_doc(&path, &Filter::default(), &summaries, &records, wide.rows.len());
        assert_eq!(doc.kpis.countries_covered, 2);
        assert_eq!(doc.kpis.countries_in_view, 2);
        assert_eq!(doc.kpis.vcm_projects_sum, 12);
        assert!(doc.unresolved_territories.is_empty());
    }

    #[test]
    fn missing_file_is_a_data_unavailable_error() {
        let res = load_raw("/nonexistent/mbm.xlsx", &LoadOptions::default());
        assert!(res.is_err());
        let res = load_raw("/nonexistent/mbm.csv", &LoadOptions::default());
        assert!(res.is_err());
    }

    #[test]
    fn unknown_input_type_is_rejected() {
        let options = LoadOptions {
            input_type: Some("parquet".to_string()),
            worksheet_name: None,
        };
        assert!(load_raw("whatever.parquet", &options).is_err());
    }
}
