//! Country display name to ISO 3166-1 alpha-3 resolution.

use log::debug;

/// Names known to fail the automated registry lookup: diacritic and
/// apostrophe variants, colloquial short names for states with longer
/// official forms, and observer entities or micro-states absent from some
/// code databases. Checked before any registry call; every entry is a test
/// case.
static MANUAL_ISO3: &[(&str, &str)] = &[
    ("Côte d’Ivoire", "CIV"),
    ("Côte d'Ivoire", "CIV"),
    ("São Tomé and Príncipe", "STP"),
    ("Democratic Republic of the Congo", "COD"),
    ("Republic of the Congo", "COG"),
    ("United States", "USA"),
    ("Russia", "RUS"),
    ("Iran", "IRN"),
    ("Syria", "SYR"),
    ("Vatican City", "VAT"),
    ("North Korea", "PRK"),
    ("South Korea", "KOR"),
    ("Laos", "LAO"),
    ("Timor-Leste", "TLS"),
    ("Brunei Darussalam", "BRN"),
    ("Bolivia", "BOL"),
    ("Venezuela", "VEN"),
    ("Tanzania", "TZA"),
    ("Micronesia", "FSM"),
    ("Palestine", "PSE"),
];

/// Resolves a country display name to its three-letter territory code.
///
/// Returns `None` for blank input or when no resolution succeeds. Unresolved
/// names are a data condition, not an error: the affected countries are
/// excluded from map rendering only.
pub fn to_iso3(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if let Some((_, code)) = MANUAL_ISO3.iter().find(|(n, _)| *n == name) {
        return Some(code);
    }
    lookup_registry(name)
}

// Delegates to the ISO 3166 registry. The registry spells several entries as
// "Name, Qualifier" or "Name (Qualifier)", so the short form before the
// separator is accepted as well.
fn lookup_registry(name: &str) -> Option<&'static str> {
    let needle = normalize(name);
    let hit = rust_iso3166::ALL.iter().find(|c| {
        if normalize(c.name) == needle {
            return true;
        }
        let short = c.name.split(&[',', '('][..]).next().unwrap_or("").trim();
        !short.is_empty() && normalize(short) == needle
    });
    if hit.is_none() {
        debug!("to_iso3: no registry match for {:?}", name);
    }
    hit.map(|c| c.alpha3)
}

// Lowercases and strips everything that is not alphanumeric, so that spacing
// and punctuation variants compare equal ("Viet Nam" == "Vietnam").
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::to_iso3;

    #[test]
    fn apostrophe_variants_resolve_identically() {
        assert_eq!(to_iso3("Côte d'Ivoire"), Some("CIV"));
        assert_eq!(to_iso3("Côte d’Ivoire"), Some("CIV"));
    }

    #[test]
    fn blank_input_is_unresolved() {
        assert_eq!(to_iso3(""), None);
        assert_eq!(to_iso3("   "), None);
    }

    #[test]
    fn plain_names_resolve_through_the_registry() {
        assert_eq!(to_iso3("France"), Some("FRA"));
        assert_eq!(to_iso3("Indonesia"), Some("IDN"));
        assert_eq!(to_iso3("  Japan "), Some("JPN"));
    }

    #[test]
    fn official_spelling_variants_resolve() {
        // Registry spellings: "Viet Nam", "Moldova, Republic of".
        assert_eq!(to_iso3("Vietnam"), Some("VNM"));
        assert_eq!(to_iso3("Moldova"), Some("MDA"));
    }

    #[test]
    fn curated_exceptions_take_precedence() {
        assert_eq!(to_iso3("United States"), Some("USA"));
        assert_eq!(to_iso3("North Korea"), Some("PRK"));
        assert_eq!(to_iso3("South Korea"), Some("KOR"));
        assert_eq!(to_iso3("Palestine"), Some("PSE"));
        assert_eq!(to_iso3("Vatican City"), Some("VAT"));
    }

    #[test]
    fn unknown_names_are_unresolved() {
        assert_eq!(to_iso3("Atlantis"), None);
        assert_eq!(to_iso3("not a country"), None);
    }
}
