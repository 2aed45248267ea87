// src/matching/address.rs - address prefix similarity and completeness scoring

use crate::matching::name::normalize;
use crate::models::CustomerRecord;

/// Only the leading characters of address line 1 take part in prefix comparison.
pub const ADDRESS_PREFIX_LENGTH: usize = 15;
pub const MIN_PREFIX_COMPARE_LENGTH: usize = 3;
pub const PREFIX_SIMILARITY_THRESHOLD: f64 = 0.8;

fn truncated_address(address: &str) -> Vec<char> {
    normalize(address)
        .chars()
        .take(ADDRESS_PREFIX_LENGTH)
        .collect()
}

/// Ratio of the shared leading run of characters to the shorter truncated address.
///
/// This is a strict from-index-0 match, not an edit distance: `"12 main"` and
/// `"21 main"` share no prefix at all.
pub fn prefix_similarity(address_a: &str, address_b: &str) -> f64 {
    let a = truncated_address(address_a);
    let b = truncated_address(address_b);
    let shorter = a.len().min(b.len());
    if shorter == 0 {
        return 0.0;
    }
    let matching = a
        .iter()
        .zip(b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    matching as f64 / shorter as f64
}

/// True when both address lines look like the same place typed differently.
pub fn addresses_look_similar(address_a: &str, address_b: &str) -> bool {
    let len_a = truncated_address(address_a).len();
    let len_b = truncated_address(address_b).len();
    if len_a < MIN_PREFIX_COMPARE_LENGTH || len_b < MIN_PREFIX_COMPARE_LENGTH {
        return false;
    }
    prefix_similarity(address_a, address_b) >= PREFIX_SIMILARITY_THRESHOLD
}

/// Same normalized customer name, both with an address line 1, prefixes agree.
pub fn records_look_similar(a: &CustomerRecord, b: &CustomerRecord) -> bool {
    if a.address1.trim().is_empty() || b.address1.trim().is_empty() {
        return false;
    }
    if normalize(&a.customer_name) != normalize(&b.customer_name) {
        return false;
    }
    addresses_look_similar(&a.address1, &b.address1)
}

/// Additive address-quality score used to pick a group's representative.
///
/// +2 for each of address1, city, state, zip present; +1 when the source
/// mentions an order file; -1 when address1 still contains a comma.
pub fn completeness_score(record: &CustomerRecord) -> i32 {
    let mut score = 0;
    for field in [&record.address1, &record.city, &record.state, &record.zip] {
        if !field.trim().is_empty() {
            score += 2;
        }
    }
    if record.source.to_lowercase().contains("order") {
        score += 1;
    }
    if record.address1.contains(',') {
        score -= 1;
    }
    score
}

/// Position (within `candidates`) of the highest-scoring record; earliest wins ties.
pub fn best_candidate<'a, I>(candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut best: Option<(usize, i32)> = None;
    for (position, record) in candidates.into_iter().enumerate() {
        let score = completeness_score(record);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((position, score)),
        }
    }
    best.map(|(position, _)| position)
}
