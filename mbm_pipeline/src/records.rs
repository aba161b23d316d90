// ********* Record schema ***********

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt::Display;

use crate::iso3::to_iso3;

/// Name of the row-ordinal column in the source spreadsheet.
pub const COL_ORDINAL: &str = "No";
/// Name of the country column in the source spreadsheet. Required.
pub const COL_COUNTRY: &str = "Country";
/// Name of the region column in the source spreadsheet.
pub const COL_REGION: &str = "Region";
/// Name of the precomputed total column in the source spreadsheet.
pub const COL_TOTAL: &str = "Total Mechanism";

/// Text reported for a country that has no record under the current filter.
pub const NO_MECHANISMS: &str = "No recorded mechanisms in this dataset.";

/// The eight categories of market-based climate policy instruments tracked by
/// the source spreadsheet.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MechanismType {
    CarbonTax,
    Ets,
    TaxIncentives,
    FuelMandates,
    VcmProject,
    Feebates,
    Cbam,
    Amc,
}

impl MechanismType {
    pub const ALL: [MechanismType; 8] = [
        MechanismType::CarbonTax,
        MechanismType::Ets,
        MechanismType::TaxIncentives,
        MechanismType::FuelMandates,
        MechanismType::VcmProject,
        MechanismType::Feebates,
        MechanismType::Cbam,
        MechanismType::Amc,
    ];

    /// The canonical display label.
    pub fn label(&self) -> &'static str {
        match self {
            MechanismType::CarbonTax => "Carbon Tax",
            MechanismType::Ets => "ETS",
            MechanismType::TaxIncentives => "Tax Incentives",
            MechanismType::FuelMandates => "Fuel Mandates",
            MechanismType::VcmProject => "VCM project",
            MechanismType::Feebates => "Feebates",
            MechanismType::Cbam => "CBAM",
            MechanismType::Amc => "AMC",
        }
    }

    /// The numbered column header as it appears in the source spreadsheet.
    pub fn source_column(&self) -> &'static str {
        match self {
            MechanismType::CarbonTax => "1. Carbon Tax",
            MechanismType::Ets => "2. ETS",
            MechanismType::TaxIncentives => "3. Tax Incentives",
            MechanismType::FuelMandates => "4. Fuel Mandates",
            MechanismType::VcmProject => "5. VCM project",
            MechanismType::Feebates => "6. Feebates",
            MechanismType::Cbam => "7. CBAM",
            MechanismType::Amc => "8. AMC",
        }
    }

    pub fn from_source_column(name: &str) -> Option<MechanismType> {
        let name = name.trim();
        MechanismType::ALL
            .iter()
            .copied()
            .find(|m| m.source_column() == name)
    }

    pub fn from_label(label: &str) -> Option<MechanismType> {
        let label = label.trim();
        MechanismType::ALL.iter().copied().find(|m| m.label() == label)
    }
}

/// The mechanism label attached to a long-form record.
///
/// Recognized columns map to one of the eight canonical types. A mechanism
/// column that appears in a future data revision keeps its own trimmed header
/// as the label instead of aborting the pipeline.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum MechanismLabel {
    Known(MechanismType),
    Other(String),
}

impl MechanismLabel {
    pub fn from_column(name: &str) -> MechanismLabel {
        let name = name.trim();
        match MechanismType::from_source_column(name) {
            Some(m) => MechanismLabel::Known(m),
            None => MechanismLabel::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MechanismLabel::Known(m) => m.label(),
            MechanismLabel::Other(s) => s.as_str(),
        }
    }

    pub fn is_vcm(&self) -> bool {
        matches!(self, MechanismLabel::Known(MechanismType::VcmProject))
    }
}

impl Display for MechanismLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Labels order by their display text so that grouped output is stable for
// display and testing.
impl Ord for MechanismLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str()).then_with(|| match (self, other) {
            (MechanismLabel::Known(_), MechanismLabel::Other(_)) => Ordering::Less,
            (MechanismLabel::Other(_), MechanismLabel::Known(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    }
}

impl PartialOrd for MechanismLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The source spreadsheet as loaded: trimmed column names and one row of text
/// cells per line. Produced once by the loaders and immutable afterward.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Finds a column by trimmed name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// A missing cell in a short row reads as blank.
    pub fn cell<'a>(&self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(|s| s.as_str()).unwrap_or("")
    }
}

/// One row of the cleaned wide table: one country, one raw (trimmed) value
/// per recognized mechanism column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WideRow {
    pub ordinal: Option<String>,
    pub country: String,
    pub region: String,
    pub values: Vec<(MechanismLabel, String)>,
    pub total_mechanism: Option<String>,
}

/// The cleaned wide table: one row per country, recognized columns only.
/// Countries with every mechanism cell empty are kept here so that they still
/// count as zero in the map views.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CleanWide {
    pub rows: Vec<WideRow>,
}

impl CleanWide {
    /// The base country list used for map inclusion: one entry per country,
    /// with its region and resolved territory code.
    pub fn base_countries(&self) -> Vec<BaseCountry> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut res: Vec<BaseCountry> = Vec::new();
        for row in self.rows.iter() {
            if seen.insert(row.country.as_str()) {
                res.push(BaseCountry {
                    country: row.country.clone(),
                    region: row.region.clone(),
                    iso3: to_iso3(&row.country),
                });
            }
        }
        res
    }
}

/// One country of the base list: the countries that must appear in the
/// summaries even when no record survives the current filter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BaseCountry {
    pub country: String,
    pub region: String,
    pub iso3: Option<&'static str>,
}

/// One long-form record: a country and one non-empty mechanism cell.
#[derive(PartialEq, Debug, Clone)]
pub struct DetailRecord {
    pub country: String,
    pub region: String,
    pub mechanism: MechanismLabel,
    pub detail_text: String,
    /// Only populated for VCM records whose detail text parses as a number.
    pub vcm_count: Option<f64>,
}

/// Aggregated view of one country under the current filter. Always rebuilt
/// from the current record set, never mutated in place.
#[derive(PartialEq, Debug, Clone)]
pub struct CountrySummary {
    pub country: String,
    pub region: String,
    pub iso3: Option<&'static str>,
    /// Number of distinct mechanism types present, 0..8.
    pub mechanism_type_count: usize,
    /// Deduplicated, sorted detail text per mechanism type.
    pub detail_by_type: BTreeMap<MechanismLabel, BTreeSet<String>>,
    /// `None` when the country has no VCM record at all; `Some(0.0)` when VCM
    /// records exist but none carried a parsable count.
    pub vcm_projects: Option<f64>,
}

impl CountrySummary {
    /// The VCM project count as displayed. Both "no VCM record" and "records
    /// present but unparsable" render as zero; callers needing the
    /// distinction inspect `vcm_projects` directly.
    pub fn vcm_projects_sum(&self) -> i64 {
        self.vcm_projects.map(|s| s as i64).unwrap_or(0)
    }

    pub fn has_mechanism(&self, label: &MechanismLabel) -> bool {
        self.detail_by_type.contains_key(label)
    }

    /// Numbered list of the mechanism types present, without the detail
    /// text. This is the compact projection used for map hover content.
    pub fn numbered_types(&self) -> Vec<String> {
        self.detail_by_type
            .keys()
            .enumerate()
            .map(|(idx, label)| format!("{}. {}", idx + 1, label))
            .collect()
    }

    /// The hover text for the map: the numbered type list, or the
    /// placeholder when nothing is present.
    pub fn hover_text(&self) -> String {
        if self.detail_by_type.is_empty() {
            NO_MECHANISMS.to_string()
        } else {
            self.numbered_types().join("\n")
        }
    }

    /// One line per mechanism type with the joined detail text. This is the
    /// expanded projection used by the country profile view.
    pub fn detail_lines(&self) -> Vec<String> {
        self.detail_by_type
            .iter()
            .map(|(label, details)| {
                let joined: Vec<&str> = details.iter().map(|s| s.as_str()).collect();
                format!("{}: {}", label, joined.join("; "))
            })
            .collect()
    }
}

/// Errors that prevent the reshaping from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PipelineErrors {
    MissingCountryColumn,
}

impl Error for PipelineErrors {}

impl Display for PipelineErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineErrors::MissingCountryColumn => {
                write!(f, "the source table has no '{}' column", COL_COUNTRY)
            }
        }
    }
}
