pub mod address;
pub mod keys;
pub mod manager;
pub mod name;

pub use address::{completeness_score, prefix_similarity};
pub use keys::grouping_key;
pub use manager::{bucket_by_company, deduplicate, CompanyBuckets, DedupResult};
pub use name::{normalize, similarity};
