// src/standardization/fallback.rs - local approximations used when the service is unavailable

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::matching::address::best_candidate;
use crate::matching::name::{mean_pairwise_similarity, names_match, normalize, NAME_SIMILARITY_THRESHOLD};
use crate::models::{CustomerRecord, DuplicateGroup};
use crate::standardization::client::{AddressResult, NameComparison, NameResult, StandardizationResult};
use crate::utils::constants::FALLBACK_CONFIDENCE;

const US_STATES: [(&str, &str); 51] = [
    ("alabama", "AL"), ("alaska", "AK"), ("arizona", "AZ"), ("arkansas", "AR"),
    ("california", "CA"), ("colorado", "CO"), ("connecticut", "CT"), ("delaware", "DE"),
    ("district of columbia", "DC"), ("florida", "FL"), ("georgia", "GA"), ("hawaii", "HI"),
    ("idaho", "ID"), ("illinois", "IL"), ("indiana", "IN"), ("iowa", "IA"),
    ("kansas", "KS"), ("kentucky", "KY"), ("louisiana", "LA"), ("maine", "ME"),
    ("maryland", "MD"), ("massachusetts", "MA"), ("michigan", "MI"), ("minnesota", "MN"),
    ("mississippi", "MS"), ("missouri", "MO"), ("montana", "MT"), ("nebraska", "NE"),
    ("nevada", "NV"), ("new hampshire", "NH"), ("new jersey", "NJ"), ("new mexico", "NM"),
    ("new york", "NY"), ("north carolina", "NC"), ("north dakota", "ND"), ("ohio", "OH"),
    ("oklahoma", "OK"), ("oregon", "OR"), ("pennsylvania", "PA"), ("rhode island", "RI"),
    ("south carolina", "SC"), ("south dakota", "SD"), ("tennessee", "TN"), ("texas", "TX"),
    ("utah", "UT"), ("vermont", "VT"), ("virginia", "VA"), ("washington", "WA"),
    ("west virginia", "WV"), ("wisconsin", "WI"), ("wyoming", "WY"),
];

static STATE_BY_NAME: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| US_STATES.iter().copied().collect());

static STATE_ABBREVIATIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| US_STATES.iter().map(|(_, abbr)| *abbr).collect());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w\S*").expect("valid word regex"));

static ZIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\b(\d{5}(?:-\d{4})?)$").expect("valid zip regex"));

static UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:suite|ste|unit|apt|apartment|bldg|building|floor|fl|room|rm)\b\.?\s*#?\s*(?:[\w-]*\d[\w-]*|[a-z]\b)|#\s*[\w-]+)",
    )
    .expect("valid unit regex")
});

const BUSINESS_TYPES: [(&str, &str); 11] = [
    ("llc", "LLC"),
    ("l l c", "LLC"),
    ("inc", "Corporation"),
    ("incorporated", "Corporation"),
    ("corp", "Corporation"),
    ("corporation", "Corporation"),
    ("ltd", "Limited"),
    ("limited", "Limited"),
    ("llp", "Partnership"),
    ("lp", "Partnership"),
    ("co", "Company"),
];

/// Capitalizes the first character of each word and lowercases the rest.
pub fn title_case(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    WORD_RE
        .replace_all(&collapsed, |caps: &regex::Captures| {
            let word = &caps[0];
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .into_owned()
}

/// Legal-form classification from a trailing suffix such as "LLC" or "Inc.".
pub fn detect_business_type(name: &str) -> Option<&'static str> {
    let cleaned: String = normalize(name)
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let cleaned = normalize(&cleaned);
    BUSINESS_TYPES
        .iter()
        .find(|(suffix, _)| cleaned.ends_with(&format!(" {}", suffix)))
        .map(|(_, business_type)| *business_type)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAddress {
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Strips a trailing state (abbreviation or full name) from `part`.
fn split_state(part: &str) -> Option<(String, &'static str)> {
    let words: Vec<&str> = part.split_whitespace().collect();
    for take in (1..=3).rev() {
        if words.len() < take {
            continue;
        }
        let (head, tail) = words.split_at(words.len() - take);
        let candidate = tail.join(" ").trim_end_matches('.').to_string();
        if let Some(abbr) = STATE_BY_NAME.get(candidate.to_lowercase().as_str()) {
            return Some((head.join(" "), *abbr));
        }
        if take == 1 {
            let upper = candidate.to_uppercase();
            if let Some(abbr) = STATE_ABBREVIATIONS.get(upper.as_str()) {
                return Some((head.join(" "), *abbr));
            }
        }
    }
    None
}

/// Splits a one-line address into components.
///
/// Recognizes a trailing ZIP (5 or 9 digit), a trailing US state, a city as
/// the comma-separated part before them, and a suite/unit designator which is
/// moved into address line 2. A designator only counts when followed by a
/// number or a single letter ("Suite 100", "Unit B"), so street names such
/// as "Building Rd" stay intact. Anything unrecognized stays in address line 1.
pub fn parse_address(raw: &str) -> ParsedAddress {
    let mut parts: Vec<String> = raw
        .split(',')
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();
    let mut parsed = ParsedAddress::default();
    if parts.is_empty() {
        return parsed;
    }

    if let Some(last) = parts.last_mut() {
        if let Some(caps) = ZIP_RE.captures(last) {
            parsed.zip = caps[2].to_string();
            *last = caps[1].trim().to_string();
        }
    }
    if parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }

    // a lone part is the street itself, whose suffix ("Ct", "Me") could pose as a state
    if parts.len() >= 2 || !parsed.zip.is_empty() {
        if let Some(last) = parts.last_mut() {
            if let Some((rest, abbr)) = split_state(last) {
                parsed.state = abbr.to_string();
                *last = rest;
            }
        }
        if parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
    }

    if parts.len() >= 2 {
        parsed.city = parts.pop().unwrap_or_default();
    }
    if parts.is_empty() {
        return parsed;
    }

    parsed.address1 = parts.remove(0);
    parsed.address2 = parts.join(", ");

    if parsed.address2.is_empty() {
        if let Some(unit) = UNIT_RE.find(&parsed.address1) {
            let unit_text = unit.as_str().trim().to_string();
            let street = format!("{}{}", &parsed.address1[..unit.start()], &parsed.address1[unit.end()..]);
            let street = street
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end_matches(|c: char| c == ',' || c == ' ')
                .to_string();
            if !street.is_empty() {
                parsed.address1 = street;
                parsed.address2 = unit_text;
            }
        }
    }
    parsed
}

pub fn fallback_name(name: &str, error: &str) -> NameResult {
    let standardized = title_case(name);
    NameResult {
        original: name.to_string(),
        changes: fallback_name_changes(name, &standardized),
        standardized,
        confidence: FALLBACK_CONFIDENCE,
        business_type: detect_business_type(name).map(str::to_string),
        error: Some(error.to_string()),
    }
}

fn fallback_name_changes(original: &str, standardized: &str) -> Vec<String> {
    let mut changes = vec!["Local fallback processing".to_string()];
    if original.trim() != standardized {
        changes.push("Title-cased name".to_string());
    }
    changes
}

pub fn fallback_address(address: &str, error: &str) -> AddressResult {
    let parsed = parse_address(address);
    AddressResult {
        original: address.to_string(),
        address1: parsed.address1,
        address2: parsed.address2,
        city: parsed.city,
        state: parsed.state,
        zip: parsed.zip,
        confidence: FALLBACK_CONFIDENCE,
        changes: vec![
            "Local fallback processing".to_string(),
            "Split address into components".to_string(),
        ],
        error: Some(error.to_string()),
    }
}

pub fn fallback_comparison(name_a: &str, name_b: &str, error: &str) -> NameComparison {
    let confidence = crate::matching::name::similarity(name_a, name_b);
    NameComparison {
        is_same: names_match(name_a, name_b),
        confidence,
        reasoning: Some(format!(
            "Local edit-distance similarity {:.2} (threshold {:.2})",
            confidence, NAME_SIMILARITY_THRESHOLD
        )),
        error: Some(error.to_string()),
    }
}

/// Which parts of a record a batch should standardize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Names,
    Addresses,
    Full,
}

impl BatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOperation::Names => "names",
            BatchOperation::Addresses => "addresses",
            BatchOperation::Full => "full",
        }
    }

    pub fn touches_names(&self) -> bool {
        matches!(self, BatchOperation::Names | BatchOperation::Full)
    }

    pub fn touches_addresses(&self) -> bool {
        matches!(self, BatchOperation::Addresses | BatchOperation::Full)
    }
}

/// Locally standardized copy of `record`, annotated with `error`.
pub fn fallback_record(record: &CustomerRecord, operation: BatchOperation, error: &str) -> StandardizationResult {
    let mut result = StandardizationResult {
        customer_name: record.customer_name.clone(),
        address1: record.address1.clone(),
        address2: record.address2.clone(),
        city: record.city.clone(),
        state: record.state.clone(),
        zip: record.zip.clone(),
        confidence: FALLBACK_CONFIDENCE,
        changes: vec!["Local fallback processing".to_string()],
        business_type: None,
        error: Some(error.to_string()),
    };

    if operation.touches_names() {
        let name = fallback_name(&record.customer_name, error);
        if name.changes.len() > 1 {
            result.changes.push("Title-cased name".to_string());
        }
        result.customer_name = name.standardized;
        result.business_type = name.business_type;
    }

    // only split when the components look like an unparsed one-line address
    let needs_split = record.city.is_empty() && record.state.is_empty() && record.zip.is_empty();
    if operation.touches_addresses() && needs_split && record.address1.contains(',') {
        let parsed = parse_address(&record.address1);
        result.address1 = parsed.address1;
        if !parsed.address2.is_empty() {
            result.address2 = parsed.address2;
        }
        result.city = parsed.city;
        result.state = parsed.state;
        result.zip = parsed.zip;
        result.changes.push("Split address into components".to_string());
    }
    result
}

/// Greedy first-come grouping by name similarity, used when the service
/// cannot find duplicates. Indices are relative to `records`.
pub fn find_duplicates_locally(records: &[CustomerRecord]) -> Vec<DuplicateGroup> {
    let mut assigned = vec![false; records.len()];
    let mut groups = Vec::new();

    for i in 0..records.len() {
        if assigned[i] {
            continue;
        }
        let mut members = vec![i];
        for j in (i + 1)..records.len() {
            if !assigned[j] && names_match(&records[i].customer_name, &records[j].customer_name) {
                members.push(j);
            }
        }
        if members.len() < 2 {
            continue;
        }
        for &m in &members {
            assigned[m] = true;
        }

        let best = best_candidate(members.iter().map(|&m| &records[m])).unwrap_or(0);
        let names: Vec<&str> = members.iter().map(|&m| records[m].customer_name.as_str()).collect();
        groups.push(DuplicateGroup {
            key: normalize(&records[i].customer_name),
            canonical_index: members[best],
            confidence: mean_pairwise_similarity(&names),
            reasoning: format!(
                "Local fallback: names within edit-distance similarity {:.2}",
                NAME_SIMILARITY_THRESHOLD
            ),
            member_indices: members,
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ACME  telecom inc"), "Acme Telecom Inc");
        assert_eq!(title_case("o'reilly-smith llc"), "O'reilly-smith Llc");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_detect_business_type() {
        assert_eq!(detect_business_type("Acme Telecom, LLC"), Some("LLC"));
        assert_eq!(detect_business_type("Acme Inc."), Some("Corporation"));
        assert_eq!(detect_business_type("Beta Holdings Ltd"), Some("Limited"));
        assert_eq!(detect_business_type("Gamma"), None);
        assert_eq!(detect_business_type("Inc"), None);
    }

    #[test]
    fn test_parse_full_address() {
        let parsed = parse_address("123 Main St Suite 100, Springfield, Illinois 62704");
        assert_eq!(
            parsed,
            ParsedAddress {
                address1: "123 Main St".into(),
                address2: "Suite 100".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zip: "62704".into(),
            }
        );
    }

    #[test]
    fn test_parse_address_with_explicit_unit_part() {
        let parsed = parse_address("500 Oak Ave, Apt 5, Reno, nv");
        assert_eq!(parsed.address1, "500 Oak Ave");
        assert_eq!(parsed.address2, "Apt 5");
        assert_eq!(parsed.city, "Reno");
        assert_eq!(parsed.state, "NV");
        assert_eq!(parsed.zip, "");
    }

    #[test]
    fn test_parse_address_zip_plus_four_and_multiword_state() {
        let parsed = parse_address("9 Elm Rd, Albany, New York 12207-1234");
        assert_eq!(parsed.city, "Albany");
        assert_eq!(parsed.state, "NY");
        assert_eq!(parsed.zip, "12207-1234");
        assert_eq!(parsed.address1, "9 Elm Rd");
    }

    #[test]
    fn test_parse_street_only() {
        let parsed = parse_address("12 Harbor Ct");
        assert_eq!(parsed.address1, "12 Harbor Ct");
        assert_eq!(parsed.state, "");
        assert_eq!(parse_address(""), ParsedAddress::default());
    }

    #[test]
    fn test_unit_words_in_street_names_are_not_units() {
        let parsed = parse_address("1 Building Rd, Dayton, OH 45402");
        assert_eq!(parsed.address1, "1 Building Rd");
        assert_eq!(parsed.address2, "");
        assert_eq!(parsed.city, "Dayton");
        assert_eq!(parsed.state, "OH");
        assert_eq!(parsed.zip, "45402");

        let parsed = parse_address("12 Fl Ave, Tampa, FL");
        assert_eq!(parsed.address1, "12 Fl Ave");
        assert_eq!(parsed.address2, "");
        assert_eq!(parsed.state, "FL");

        let parsed = parse_address("40 Suite Street, Reno, NV");
        assert_eq!(parsed.address1, "40 Suite Street");
    }

    #[test]
    fn test_single_letter_and_mixed_units() {
        let parsed = parse_address("5 Main St Unit B, Reno, NV");
        assert_eq!(parsed.address1, "5 Main St");
        assert_eq!(parsed.address2, "Unit B");

        let parsed = parse_address("5 Main St Fl 3A, Reno, NV");
        assert_eq!(parsed.address1, "5 Main St");
        assert_eq!(parsed.address2, "Fl 3A");
    }

    #[test]
    fn test_fallback_record_keeps_street_name() {
        let record = CustomerRecord::new("acme", "1 Building Rd, Dayton, OH 45402", "", "", "", "", "x");
        let result = fallback_record(&record, BatchOperation::Full, "down");
        assert_eq!(result.address1, "1 Building Rd");
        assert_eq!(result.address2, "");
    }

    #[test]
    fn test_parse_hash_unit() {
        let parsed = parse_address("77 Pine St #4B, Boise, ID 83702");
        assert_eq!(parsed.address1, "77 Pine St");
        assert_eq!(parsed.address2, "#4B");
        assert_eq!(parsed.city, "Boise");
        assert_eq!(parsed.state, "ID");
    }

    #[test]
    fn test_fallback_record_full() {
        let record = CustomerRecord::new("ACME TELECOM LLC", "1 Elm St, Dayton, OH 45402", "", "", "", "", "Order File");
        let result = fallback_record(&record, BatchOperation::Full, "service down");
        assert_eq!(result.customer_name, "Acme Telecom Llc");
        assert_eq!(result.business_type.as_deref(), Some("LLC"));
        assert_eq!(result.address1, "1 Elm St");
        assert_eq!(result.city, "Dayton");
        assert_eq!(result.state, "OH");
        assert_eq!(result.zip, "45402");
        assert_eq!(result.error.as_deref(), Some("service down"));
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_fallback_record_names_only_keeps_address() {
        let record = CustomerRecord::new("beta", "1 Elm St, Dayton, OH", "", "", "", "", "x");
        let result = fallback_record(&record, BatchOperation::Names, "e");
        assert_eq!(result.customer_name, "Beta");
        assert_eq!(result.address1, "1 Elm St, Dayton, OH");
    }

    #[test]
    fn test_fallback_comparison() {
        let same = fallback_comparison("Acme Telecom", "ACME Telecom.", "down");
        assert!(same.is_same);
        let different = fallback_comparison("Acme", "Zenith", "down");
        assert!(!different.is_same);
        assert!(different.error.is_some());
    }

    #[test]
    fn test_find_duplicates_locally() {
        let records = vec![
            CustomerRecord::new("Acme Telecom", "", "", "", "", "", "Commission File"),
            CustomerRecord::new("Zenith Wireless", "", "", "", "", "", "x"),
            CustomerRecord::new("Acme Telecom.", "1 Elm", "", "Dayton", "", "", "Order File"),
            CustomerRecord::new("ACME TELECOM", "", "", "", "", "", "x"),
        ];
        let groups = find_duplicates_locally(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_indices, vec![0, 2, 3]);
        assert_eq!(groups[0].canonical_index, 2);
        assert!(groups[0].confidence > 0.9 && groups[0].confidence <= 1.0);
    }
}
