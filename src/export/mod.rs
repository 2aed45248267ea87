pub mod csv_export;

pub use csv_export::{export_column_mapping, write_records_csv, write_records_csv_path};
