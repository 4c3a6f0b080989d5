//! Country-code display names
//!
//! The tracking provider reports alpha-2 codes; the published sheet wants
//! readable names. The mapping table is bundled so a run has no extra file
//! dependency. Unknown codes pass through unchanged.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static COUNTRY_CODES_CSV: &str = include_str!("../data/country-codes.csv");

static COUNTRIES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    let mut map = HashMap::new();
    let mut reader = csv::Reader::from_reader(COUNTRY_CODES_CSV.as_bytes());
    for record in reader.records().flatten() {
        if let (Some(code), Some(name)) = (record.get(0), record.get(1)) {
            map.insert(code.to_string(), name.to_string());
        }
    }
    map
});

/// Display name for an alpha-2 code; unknown or empty codes pass through
pub fn country_name(code: &str) -> String {
    COUNTRIES
        .get(code.trim())
        .cloned()
        .unwrap_or_else(|| code.to_string())
}
