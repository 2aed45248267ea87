// src/extraction/record_extractor.rs

use crate::errors::MappingError;
use crate::models::{ColumnMapping, CustomerRecord, ParsedFile, RawRow};
use crate::utils::progress_bars::logging::{DedupLogger, PipelineStage};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<CustomerRecord>,
    /// Rows dropped for lacking a customer name.
    pub skipped_rows: usize,
}

/// Checks the mapping names a customer column, at least one address column,
/// and only headers that exist in `file`.
pub fn validate_mapping(
    mapping: &ColumnMapping,
    file: &ParsedFile,
    source_label: &str,
) -> Result<(), MappingError> {
    if mapping.customer_name.is_none() {
        return Err(MappingError::MissingCustomerName {
            source_label: source_label.to_string(),
        });
    }
    if !mapping.has_address_field() {
        return Err(MappingError::MissingAddress {
            source_label: source_label.to_string(),
        });
    }
    if let Some(header) = mapping
        .mapped_headers()
        .into_iter()
        .find(|h| !file.has_header(h))
    {
        return Err(MappingError::UnknownHeader {
            source_label: source_label.to_string(),
            header: header.to_string(),
        });
    }
    Ok(())
}

fn cell(row: &RawRow, header: &Option<String>) -> String {
    header
        .as_deref()
        .and_then(|h| row.get(h))
        .unwrap_or_default()
        .to_string()
}

/// Builds one record from a row, or `None` when the row has no customer name.
pub fn extract_record(row: &RawRow, mapping: &ColumnMapping, source_label: &str) -> Option<CustomerRecord> {
    let name = cell(row, &mapping.customer_name);
    if name.is_empty() {
        return None;
    }
    let record = if mapping.uses_single_address() {
        CustomerRecord::new(name, cell(row, &mapping.single_address), "", "", "", "", source_label)
    } else {
        CustomerRecord::new(
            name,
            cell(row, &mapping.address1),
            cell(row, &mapping.address2),
            cell(row, &mapping.city),
            cell(row, &mapping.state),
            cell(row, &mapping.zip),
            source_label,
        )
    };
    Some(record)
}

/// Validates the mapping, then extracts every row that has a customer name.
pub fn extract_records(
    file: &ParsedFile,
    mapping: &ColumnMapping,
    source_label: &str,
) -> Result<Extraction, MappingError> {
    let logger = DedupLogger::new(PipelineStage::Extraction);
    validate_mapping(mapping, file, source_label)?;

    let mut extraction = Extraction::default();
    for row in &file.rows {
        match extract_record(row, mapping, source_label) {
            Some(record) => extraction.records.push(record),
            None => extraction.skipped_rows += 1,
        }
    }

    logger.log_skipped_rows(extraction.skipped_rows, "no customer name");
    logger.log_completion(&format!(
        "{} records extracted from '{}' ({} rows)",
        extraction.records.len(),
        source_label,
        file.rows.len()
    ));
    Ok(extraction)
}
