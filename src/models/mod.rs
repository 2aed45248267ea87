pub mod core;
pub mod stats_models;

pub use self::core::{
    ColumnMapping, CustomerRecord, DuplicateGroup, ParsedFile, RawRow, StandardizationMetadata,
    NO_ADDRESS,
};
pub use self::stats_models::{DedupStats, KeyStrategy, StandardizationStats};
