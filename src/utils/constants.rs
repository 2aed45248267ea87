// src/utils/constants.rs

/// Records per request for generic standardization operations.
pub const STANDARDIZE_BATCH_SIZE: usize = 25;

/// Records per request when asking the service for duplicate groups.
pub const DUPLICATE_CHUNK_SIZE: usize = 50;

/// Above this many records, duplicate finding is split into chunks.
/// Duplicates spanning two chunks are not detected.
pub const DUPLICATE_CHUNK_THRESHOLD: usize = 100;

/// Pause before each request to stay under the provider's rate limit.
pub const REQUEST_DELAY_MS: u64 = 500;

pub const REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_STANDARDIZE_API_URL: &str = "http://localhost:3000/api/standardize";

/// Confidence attached to locally computed fallback results.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;
