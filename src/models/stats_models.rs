// src/models/stats_models.rs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects what counts as an exact duplicate in the dedup engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Name plus the full combined address.
    #[default]
    Loose,
    /// Name plus address line 1 plus city.
    Strict,
}

impl KeyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStrategy::Loose => "loose",
            KeyStrategy::Strict => "strict",
        }
    }
}

impl fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "loose" => Ok(KeyStrategy::Loose),
            "strict" => Ok(KeyStrategy::Strict),
            other => Err(format!("unknown key strategy '{}' (expected loose or strict)", other)),
        }
    }
}

/// Counters gathered during one dedup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub strategy: KeyStrategy,
    pub input_records: usize,
    pub skipped_records: usize,
    pub unique_records: usize,
    pub duplicate_records: usize,
    pub groups_with_duplicates: usize,
    pub similar_address_records: usize,
    pub processing_time: f64,
}

impl DedupStats {
    pub fn new(run_id: String, run_timestamp: NaiveDateTime, strategy: KeyStrategy) -> Self {
        Self {
            run_id,
            run_timestamp,
            strategy,
            input_records: 0,
            skipped_records: 0,
            unique_records: 0,
            duplicate_records: 0,
            groups_with_duplicates: 0,
            similar_address_records: 0,
            processing_time: 0.0,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizationStats {
    pub total_records: usize,
    pub batches_total: usize,
    pub batches_succeeded: usize,
    pub batches_failed: usize,
    pub fallback_records: usize,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strategy_parse() {
        assert_eq!("loose".parse::<KeyStrategy>(), Ok(KeyStrategy::Loose));
        assert_eq!(" STRICT ".parse::<KeyStrategy>(), Ok(KeyStrategy::Strict));
        assert!("fuzzy".parse::<KeyStrategy>().is_err());
        assert_eq!(KeyStrategy::default(), KeyStrategy::Loose);
        assert_eq!(KeyStrategy::Strict.to_string(), "strict");
    }
}
