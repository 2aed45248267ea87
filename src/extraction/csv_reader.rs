// src/extraction/csv_reader.rs

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::models::{ParsedFile, RawRow};

/// Reads a header-first CSV into a [`ParsedFile`].
///
/// Short rows are accepted; cells past the end of a row are simply absent.
pub fn read_csv<R: Read>(input: R) -> Result<ParsedFile> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", line + 2))?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(ParsedFile { headers, rows })
}

pub fn read_csv_path(path: &Path) -> Result<ParsedFile> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_csv(BufReader::new(file)).with_context(|| format!("Failed to parse {}", path.display()))
}
