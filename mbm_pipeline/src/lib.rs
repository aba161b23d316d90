//! Core data pipeline for the global market-based mechanisms dataset.
//!
//! The source is a wide spreadsheet with one row per country and one column
//! per mechanism type. This crate reshapes it into a long record set, applies
//! user-chosen filters and aggregates per-country summaries that drive the
//! map coloring and the drill-down views. It performs no I/O; see the
//! `mbmdata` binary for the loaders and the export.
//!
//! ```
//! use mbm_pipeline::*;
//!
//! let raw = RawTable {
//!     columns: vec![
//!         "Country".to_string(),
//!         "Region".to_string(),
//!         "1. Carbon Tax".to_string(),
//!     ],
//!     rows: vec![vec![
//!         "Indonesia".to_string(),
//!         "Asia".to_string(),
//!         "Carbon tax on coal".to_string(),
//!     ]],
//! };
//! let (wide, records) = reshape(&raw)?;
//! let summaries = summarize(&records, &wide.base_countries());
//! assert_eq!(summaries[0].mechanism_type_count, 1);
//! # Ok::<(), mbm_pipeline::PipelineErrors>(())
//! ```
pub mod iso3;
pub mod manual;
mod records;

use log::{debug, info};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

pub use crate::iso3::to_iso3;
pub use crate::records::*;

/// Converts the raw wide table into the cleaned wide table and the long
/// record set.
///
/// Recognized columns are the identifier, country, region, the eight
/// mechanism columns and the precomputed total; anything else is dropped
/// without error. Rows with a blank country, or whose country cell is a
/// re-included header line, are discarded.
pub fn reshape(raw: &RawTable) -> Result<(CleanWide, Vec<DetailRecord>), PipelineErrors> {
    let country_idx = raw
        .column_index(COL_COUNTRY)
        .ok_or(PipelineErrors::MissingCountryColumn)?;
    let ordinal_idx = raw.column_index(COL_ORDINAL);
    let region_idx = raw.column_index(COL_REGION);
    let total_idx = raw.column_index(COL_TOTAL);

    let mech_cols = mechanism_columns(raw, &[ordinal_idx, Some(country_idx), region_idx, total_idx]);
    debug!("reshape: {} mechanism columns recognized", mech_cols.len());

    let mut wide: Vec<WideRow> = Vec::new();
    let mut records: Vec<DetailRecord> = Vec::new();

    for row in raw.rows.iter() {
        let country = raw.cell(row, country_idx).trim();
        // Blank line, or a header row that made it back into the data.
        if country.is_empty() || country.eq_ignore_ascii_case("country") {
            continue;
        }
        let region = region_idx
            .map(|idx| raw.cell(row, idx).trim().to_string())
            .unwrap_or_default();

        let mut values: Vec<(MechanismLabel, String)> = Vec::new();
        for (idx, label) in mech_cols.iter() {
            let text = raw.cell(row, *idx).trim().to_string();
            values.push((label.clone(), text.clone()));

            if text.is_empty() || text.eq_ignore_ascii_case("nan") {
                continue;
            }
            // An explicit "0" in a presence column means "not applicable",
            // not genuine detail.
            if !label.is_vcm() && text == "0" {
                continue;
            }
            let vcm_count = if label.is_vcm() {
                let parsed = text.parse::<f64>().ok();
                if parsed.is_none() {
                    debug!("reshape: unparsable VCM count for {}: {:?}", country, text);
                }
                parsed
            } else {
                None
            };
            records.push(DetailRecord {
                country: country.to_string(),
                region: region.clone(),
                mechanism: label.clone(),
                detail_text: text,
                vcm_count,
            });
        }

        wide.push(WideRow {
            ordinal: ordinal_idx
                .map(|idx| raw.cell(row, idx).trim().to_string())
                .filter(|s| !s.is_empty()),
            country: country.to_string(),
            region,
            values,
            total_mechanism: total_idx
                .map(|idx| raw.cell(row, idx).trim().to_string())
                .filter(|s| !s.is_empty()),
        });
    }

    info!(
        "reshape: {} countries, {} detail records",
        wide.len(),
        records.len()
    );
    Ok((CleanWide { rows: wide }, records))
}

// The mechanism columns of the table, in spreadsheet order. Known numbered
// headers map to their canonical type; a numbered header from a future data
// revision is carried through with its own name as the label. Any other
// unrecognized column is dropped.
fn mechanism_columns(raw: &RawTable, structural: &[Option<usize>]) -> Vec<(usize, MechanismLabel)> {
    raw.columns
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            if structural.contains(&Some(idx)) {
                return None;
            }
            let name = name.trim();
            match MechanismType::from_source_column(name) {
                Some(m) => Some((idx, MechanismLabel::Known(m))),
                None if is_numbered_header(name) => {
                    Some((idx, MechanismLabel::Other(name.to_string())))
                }
                None => None,
            }
        })
        .collect()
}

// "9. Something new" style headers.
fn is_numbered_header(name: &str) -> bool {
    match name.split_once('.') {
        Some((prefix, rest)) => {
            !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_digit())
                && !rest.trim().is_empty()
        }
        None => false,
    }
}

/// A user-chosen restriction over the long record set. Empty selections do
/// not constrain; the keyword is a case-insensitive substring search over the
/// detail text.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Filter {
    pub regions: Vec<String>,
    pub mechanisms: Vec<String>,
    pub countries: Vec<String>,
    pub keyword: Option<String>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
            && self.mechanisms.is_empty()
            && self.countries.is_empty()
            && self.keyword.as_deref().map(str::trim).unwrap_or("").is_empty()
    }

    fn keeps(&self, r: &DetailRecord) -> bool {
        if !self.regions.is_empty() && !self.regions.iter().any(|x| x == &r.region) {
            return false;
        }
        if !self.mechanisms.is_empty() && !self.mechanisms.iter().any(|x| x == r.mechanism.as_str())
        {
            return false;
        }
        if !self.countries.is_empty() && !self.countries.iter().any(|x| x == &r.country) {
            return false;
        }
        if let Some(kw) = self.keyword.as_deref() {
            let kw = kw.trim().to_lowercase();
            if !kw.is_empty() && !r.detail_text.to_lowercase().contains(&kw) {
                return false;
            }
        }
        true
    }

    // The base country list only narrows on region and country; mechanism and
    // keyword selections must not drop zero-count countries from the map.
    fn keeps_country(&self, b: &BaseCountry) -> bool {
        if !self.regions.is_empty() && !self.regions.iter().any(|x| x == &b.region) {
            return false;
        }
        if !self.countries.is_empty() && !self.countries.iter().any(|x| x == &b.country) {
            return false;
        }
        true
    }
}

/// Applies a filter to the long record set, producing a fresh set.
pub fn apply_filter(records: &[DetailRecord], filter: &Filter) -> Vec<DetailRecord> {
    records.iter().filter(|r| filter.keeps(r)).cloned().collect()
}

/// Applies the region/country part of a filter to the base country list.
pub fn filter_base(base: &[BaseCountry], filter: &Filter) -> Vec<BaseCountry> {
    base.iter()
        .filter(|b| filter.keeps_country(b))
        .cloned()
        .collect()
}

/// Aggregates the (already filtered) record set into one summary per base
/// country, in base order.
///
/// Countries present in the base list but absent from the records report zero
/// counts rather than being omitted. This function performs no I/O and cannot
/// fail on valid input.
pub fn summarize(records: &[DetailRecord], base: &[BaseCountry]) -> Vec<CountrySummary> {
    let mut grouped: HashMap<&str, BTreeMap<MechanismLabel, BTreeSet<String>>> = HashMap::new();
    let mut vcm_sums: HashMap<&str, f64> = HashMap::new();
    let mut vcm_present: HashSet<&str> = HashSet::new();

    for r in records.iter() {
        let by_type = grouped.entry(r.country.as_str()).or_default();
        let details = by_type.entry(r.mechanism.clone()).or_default();
        // One cell may list several entries separated by semicolons; they are
        // deduplicated as a set, never summed.
        for piece in r.detail_text.split(';') {
            let piece = piece.trim();
            if !piece.is_empty() && !piece.eq_ignore_ascii_case("nan") {
                details.insert(piece.to_string());
            }
        }
        if r.mechanism.is_vcm() {
            vcm_present.insert(r.country.as_str());
            if let Some(n) = r.vcm_count {
                *vcm_sums.entry(r.country.as_str()).or_insert(0.0) += n;
            }
        }
    }

    // A record whose detail text reduced to nothing must not count as a
    // present mechanism type.
    for by_type in grouped.values_mut() {
        by_type.retain(|_, details| !details.is_empty());
    }

    base.iter()
        .map(|b| {
            let detail_by_type = grouped.get(b.country.as_str()).cloned().unwrap_or_default();
            let vcm_projects = if vcm_present.contains(b.country.as_str()) {
                Some(vcm_sums.get(b.country.as_str()).copied().unwrap_or(0.0))
            } else {
                None
            };
            CountrySummary {
                country: b.country.clone(),
                region: b.region.clone(),
                iso3: b.iso3,
                mechanism_type_count: detail_by_type.len(),
                detail_by_type,
                vcm_projects,
            }
        })
        .collect()
}

/// Distinct-country count per mechanism label, most covered first.
pub fn mechanism_coverage(records: &[DetailRecord]) -> Vec<(MechanismLabel, usize)> {
    let mut per_label: BTreeMap<MechanismLabel, HashSet<&str>> = BTreeMap::new();
    for r in records.iter() {
        per_label
            .entry(r.mechanism.clone())
            .or_default()
            .insert(r.country.as_str());
    }
    let mut res: Vec<(MechanismLabel, usize)> = per_label
        .into_iter()
        .map(|(label, countries)| (label, countries.len()))
        .collect();
    res.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    res
}

/// Total parsable VCM project count per country, largest first. Countries
/// without a parsable count are omitted.
pub fn vcm_totals(records: &[DetailRecord]) -> Vec<(String, i64)> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records.iter() {
        if let Some(n) = r.vcm_count {
            *sums.entry(r.country.as_str()).or_insert(0.0) += n;
        }
    }
    let mut res: Vec<(String, i64)> = sums
        .into_iter()
        .map(|(country, sum)| (country.to_string(), sum as i64))
        .collect();
    res.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    res
}
