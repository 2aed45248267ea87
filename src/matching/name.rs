// src/matching/name.rs - text normalization and edit-distance similarity

use strsim::levenshtein;

/// Names at or above this similarity are treated as the same customer when
/// no external comparison service is available.
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Lowercases, trims and collapses internal whitespace.
///
/// Every comparison key in the crate goes through this function; raw strings
/// are never compared directly.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Edit-distance similarity of the normalized inputs, in `[0, 1]`.
///
/// `(max_len - levenshtein) / max_len`, with `1.0` for two empty strings and
/// `0.0` when exactly one side is empty. Cost is O(len(a) * len(b)), so callers
/// comparing whole populations should chunk or pre-filter.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    match (len_a, len_b) {
        (0, 0) => return 1.0,
        (0, _) | (_, 0) => return 0.0,
        _ => {}
    }

    let max_len = len_a.max(len_b);
    let distance = levenshtein(&a, &b);
    (max_len - distance.min(max_len)) as f64 / max_len as f64
}

/// Local stand-in for the external name comparison.
pub fn names_match(a: &str, b: &str) -> bool {
    similarity(a, b) >= NAME_SIMILARITY_THRESHOLD
}

/// Mean similarity over every unordered pair; `1.0` for fewer than two values.
pub fn mean_pairwise_similarity(values: &[&str]) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            total += similarity(values[i], values[j]);
            pairs += 1;
        }
    }
    total / pairs as f64
}
