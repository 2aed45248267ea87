// src/errors.rs

use thiserror::Error;

/// A column mapping that cannot drive extraction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("column mapping for '{source_label}' does not name a customer name column")]
    MissingCustomerName { source_label: String },
    #[error("column mapping for '{source_label}' does not name any address column")]
    MissingAddress { source_label: String },
    #[error("column mapping for '{source_label}' references header '{header}' which is not in the file")]
    UnknownHeader { source_label: String, header: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StandardizationError {
    /// Network failure, non-2xx status, malformed body or `success: false`.
    /// Absorbed at the batch boundary and turned into fallback results.
    #[error("standardization service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Missing credential or unusable endpoint. Local-only operations are unaffected.
    #[error("standardization service misconfigured: {0}")]
    Configuration(String),
    #[error("standardization cancelled after {completed_batches} of {total_batches} batches")]
    Cancelled {
        completed_batches: usize,
        total_batches: usize,
    },
}

impl From<reqwest::Error> for StandardizationError {
    fn from(e: reqwest::Error) -> Self {
        StandardizationError::ServiceUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StandardizationError {
    fn from(e: serde_json::Error) -> Self {
        StandardizationError::ServiceUnavailable(format!("malformed response: {}", e))
    }
}
