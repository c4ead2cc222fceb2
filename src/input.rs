//! Input feed reader.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Read `product_source_id` values from the input CSV.
///
/// Only that column is used; anything else the feed export carries is
/// ignored. Values are trimmed and blank cells dropped. A missing column is
/// a configuration error, not a per-row one, so it fails the whole run.
pub fn read_product_source_ids(path: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("opening input CSV {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let Some(idx) = headers.iter().position(|h| h == "product_source_id") else {
        bail!(
            "input CSV {} must contain a 'product_source_id' column (found: {:?})",
            path.display(),
            headers.iter().collect::<Vec<_>>()
        );
    };

    let mut values = Vec::new();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("reading {}", path.display()))?;
        let value = rec.get(idx).unwrap_or("").trim();
        if !value.is_empty() {
            values.push(value.to_string());
        }
    }
    Ok(values)
}
