// src/models/core.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder stored in `combined_address` when a record carries no address parts.
pub const NO_ADDRESS: &str = "No address";

/// One data row from an uploaded file, keyed by column header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow(pub HashMap<String, String>);

impl RawRow {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Trimmed cell value, `None` when the header is absent or the cell is blank.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.0
            .get(header)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.0.insert(header.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Headers plus rows, as handed over by the upload collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedFile {
    pub fn has_header(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }
}

/// Which header supplies each semantic field of a source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub customer_name: Option<String>,
    pub single_address: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

impl ColumnMapping {
    /// Headers named by this mapping, in field order.
    pub fn mapped_headers(&self) -> Vec<&str> {
        [
            &self.customer_name,
            &self.single_address,
            &self.address1,
            &self.address2,
            &self.city,
            &self.state,
            &self.zip,
        ]
        .into_iter()
        .filter_map(|h| h.as_deref())
        .collect()
    }

    pub fn has_address_field(&self) -> bool {
        self.single_address.is_some()
            || self.address1.is_some()
            || self.address2.is_some()
            || self.city.is_some()
            || self.state.is_some()
            || self.zip.is_some()
    }

    pub fn uses_single_address(&self) -> bool {
        self.single_address.is_some()
    }
}

/// Present only after the standardization orchestrator has touched a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizationMetadata {
    pub confidence: f64,
    pub changes: Vec<String>,
    pub business_type: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub customer_name: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub combined_address: String,
    pub source: String,
    pub is_duplicate: bool,
    pub is_similar: bool,
    pub is_selectable_duplicate: bool,
    pub standardization: Option<StandardizationMetadata>,
}

impl CustomerRecord {
    /// Builds a record and derives `combined_address` from the given parts.
    pub fn new(
        customer_name: impl Into<String>,
        address1: impl Into<String>,
        address2: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        let mut record = Self {
            customer_name: customer_name.into().trim().to_string(),
            address1: address1.into().trim().to_string(),
            address2: address2.into().trim().to_string(),
            city: city.into().trim().to_string(),
            state: state.into().trim().to_string(),
            zip: zip.into().trim().to_string(),
            source: source.into(),
            ..Default::default()
        };
        record.recompute_combined_address();
        record
    }

    /// Comma-joins the non-empty address parts, or stores [`NO_ADDRESS`].
    pub fn recompute_combined_address(&mut self) {
        self.combined_address = combine_address_parts(&[
            &self.address1,
            &self.address2,
            &self.city,
            &self.state,
            &self.zip,
        ]);
    }

    pub fn has_address(&self) -> bool {
        self.combined_address != NO_ADDRESS
    }

    /// Records are exported by default unless they are a non-preferred duplicate.
    pub fn is_selected_by_default(&self) -> bool {
        !self.is_duplicate || self.is_selectable_duplicate
    }
}

pub fn combine_address_parts(parts: &[&str]) -> String {
    let present: Vec<&str> = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if present.is_empty() {
        NO_ADDRESS.to_string()
    } else {
        present.join(", ")
    }
}

/// A canonical record plus every record judged to be the same customer.
///
/// Indices point into the record slice the group was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub key: String,
    pub canonical_index: usize,
    pub member_indices: Vec<usize>,
    pub confidence: f64,
    pub reasoning: String,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.member_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.member_indices.contains(&index)
    }
}
