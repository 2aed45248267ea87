// src/matching/keys.rs

use crate::matching::name::normalize;
use crate::models::{CustomerRecord, KeyStrategy};

/// `name|combined address`
pub fn loose_key(record: &CustomerRecord) -> String {
    format!(
        "{}|{}",
        normalize(&record.customer_name),
        normalize(&record.combined_address)
    )
}

/// `name_address1_city`
pub fn strict_key(record: &CustomerRecord) -> String {
    format!(
        "{}_{}_{}",
        normalize(&record.customer_name),
        normalize(&record.address1),
        normalize(&record.city)
    )
}

pub fn grouping_key(record: &CustomerRecord, strategy: KeyStrategy) -> String {
    match strategy {
        KeyStrategy::Loose => loose_key(record),
        KeyStrategy::Strict => strict_key(record),
    }
}
