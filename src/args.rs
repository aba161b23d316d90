use clap::Parser;

use mbm_pipeline::Filter;

/// Loads the market-based mechanisms spreadsheet, applies the requested
/// filters and writes the aggregated country summaries.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The spreadsheet with one row per country and one column per
    /// mechanism type. Excel (.xlsx) and CSV files are supported.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (default inferred from the file extension) The type of the input:
    /// 'xlsx' or 'csv'.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file with several worksheets, indicates the name of
    /// the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the summary document in
    /// JSON format. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) If specified, the filtered records are exported as CSV to
    /// the given location.
    #[clap(short, long, value_parser)]
    pub export: Option<String>,

    /// (file path) A reference summary document in JSON format. If provided,
    /// mbmdata will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Restricts the records to the given regions. May be repeated.
    #[clap(long, value_parser)]
    pub region: Option<Vec<String>>,

    /// Restricts the records to the given mechanism types. May be repeated.
    #[clap(long, value_parser)]
    pub mechanism_type: Option<Vec<String>>,

    /// Restricts the records to the given countries. May be repeated.
    #[clap(long, value_parser)]
    pub country: Option<Vec<String>>,

    /// Case-insensitive search over the detail text.
    #[clap(short, long, value_parser)]
    pub keyword: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard
    /// output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

impl Args {
    pub fn filter(&self) -> Filter {
        Filter {
            regions: self.region.clone().unwrap_or_default(),
            mechanisms: self.mechanism_type.clone().unwrap_or_default(),
            countries: self.country.clone().unwrap_or_default(),
            keyword: self.keyword.clone(),
        }
    }
}
