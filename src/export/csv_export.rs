// src/export/csv_export.rs

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::models::{ColumnMapping, CustomerRecord};
use crate::utils::progress_bars::logging::{DedupLogger, PipelineStage};

pub const HEADER_CUSTOMER_NAME: &str = "Customer Name";
pub const HEADER_ADDRESS1: &str = "Address 1";
pub const HEADER_ADDRESS2: &str = "Address 2";
pub const HEADER_CITY: &str = "City";
pub const HEADER_STATE: &str = "State";
pub const HEADER_ZIP: &str = "ZIP";

const RECORD_HEADERS: [&str; 11] = [
    HEADER_CUSTOMER_NAME,
    HEADER_ADDRESS1,
    HEADER_ADDRESS2,
    HEADER_CITY,
    HEADER_STATE,
    HEADER_ZIP,
    "Combined Address",
    "Source",
    "Duplicate",
    "Similar Address",
    "Preferred Duplicate",
];

const STANDARDIZATION_HEADERS: [&str; 4] = [
    "Confidence",
    "Changes",
    "Business Type",
    "Standardization Error",
];

/// Mapping that reads an exported file back through the record extractor.
pub fn export_column_mapping() -> ColumnMapping {
    ColumnMapping {
        customer_name: Some(HEADER_CUSTOMER_NAME.to_string()),
        single_address: None,
        address1: Some(HEADER_ADDRESS1.to_string()),
        address2: Some(HEADER_ADDRESS2.to_string()),
        city: Some(HEADER_CITY.to_string()),
        state: Some(HEADER_STATE.to_string()),
        zip: Some(HEADER_ZIP.to_string()),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn record_fields(record: &CustomerRecord) -> Vec<String> {
    vec![
        record.customer_name.clone(),
        record.address1.clone(),
        record.address2.clone(),
        record.city.clone(),
        record.state.clone(),
        record.zip.clone(),
        record.combined_address.clone(),
        record.source.clone(),
        yes_no(record.is_duplicate).to_string(),
        yes_no(record.is_similar).to_string(),
        yes_no(record.is_selectable_duplicate).to_string(),
    ]
}

fn standardization_fields(record: &CustomerRecord) -> Vec<String> {
    match &record.standardization {
        Some(meta) => vec![
            format!("{:.2}", meta.confidence),
            meta.changes.join("; "),
            meta.business_type.clone().unwrap_or_default(),
            meta.error.clone().unwrap_or_default(),
        ],
        None => vec![String::new(); STANDARDIZATION_HEADERS.len()],
    }
}

/// Writes records as comma-delimited UTF-8 with every field double-quoted.
pub fn write_records_csv<W: Write>(writer: W, records: &[CustomerRecord], include_standardization: bool) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    let mut headers: Vec<&str> = RECORD_HEADERS.to_vec();
    if include_standardization {
        headers.extend(STANDARDIZATION_HEADERS);
    }
    csv_writer
        .write_record(&headers)
        .context("Failed to write CSV header")?;

    for record in records {
        let mut fields = record_fields(record);
        if include_standardization {
            fields.extend(standardization_fields(record));
        }
        csv_writer
            .write_record(&fields)
            .with_context(|| format!("Failed to write CSV row for '{}'", record.customer_name))?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

pub fn write_records_csv_path(path: &Path, records: &[CustomerRecord], include_standardization: bool) -> Result<()> {
    let logger = DedupLogger::new(PipelineStage::Export);
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_records_csv(file, records, include_standardization)
        .with_context(|| format!("Failed to export {}", path.display()))?;
    logger.log_completion(&format!("{} records written to {}", records.len(), path.display()));
    Ok(())
}
