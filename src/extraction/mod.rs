pub mod csv_reader;
pub mod record_extractor;

pub use csv_reader::{read_csv, read_csv_path};
pub use record_extractor::{extract_record, extract_records, validate_mapping, Extraction};
