//! # Row Ingestion
//!
//! Upstream data sources produce the normalized structure the binding
//! engine consumes: a list of [`HeaderDescriptor`]s and a list of [`Row`]
//! mappings. Column keys come from the same normalization as slot
//! markers, so a `"Product Name"` column lands on the `product_name`
//! slot without any mapping UI.
//!
//! Two sources ship here: local XLSX workbooks ([`xlsx`]) and the Google
//! Sheets REST API ([`sheets`]). Both funnel through [`derive_headers`]
//! and [`rows_from_cells`], so their output is indistinguishable to the
//! binder.

pub mod sheets;
pub mod xlsx;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::binding::normalize_key;

/// One data row: slot identifier → string value. An empty string is a
/// real value, distinct from a missing key.
pub type Row = HashMap<String, String>;

/// One column: the normalized key rows are addressed by, and the label
/// the spreadsheet showed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderDescriptor {
    pub key: String,
    pub label: String,
}

/// Headers plus rows, ready for the binder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetData {
    pub headers: Vec<HeaderDescriptor>,
    pub rows: Vec<Row>,
}

/// Derive deduplicated column keys from raw labels.
///
/// Labels normalize with [`normalize_key`]; an empty result falls back to
/// `col_N` (1-based). When two labels collide on the same key, the first
/// keeps it and later ones get `_1`, `_2`… suffixes, deterministically.
pub fn derive_headers(labels: &[String]) -> Vec<HeaderDescriptor> {
    let mut used = std::collections::HashSet::new();
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let base = {
                let k = normalize_key(label);
                if k.is_empty() { format!("col_{}", i + 1) } else { k }
            };
            let mut key = base.clone();
            let mut n = 1;
            while !used.insert(key.clone()) {
                key = format!("{base}_{n}");
                n += 1;
            }
            HeaderDescriptor {
                key,
                label: label.clone(),
            }
        })
        .collect()
}

/// Zip cell rows against derived headers. Short rows pad with empty
/// strings so every key is present in every row.
pub fn rows_from_cells(headers: &[HeaderDescriptor], cells: &[Vec<String>]) -> Vec<Row> {
    cells
        .iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.key.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}
