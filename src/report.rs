//! Report output: append-only CSV with per-row flushing, plus the resume
//! scan that makes re-runs skip work already saved.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

use crate::extract::ProductInfo;

/// Column order is fixed; downstream sheets key off these names.
pub const REPORT_COLUMNS: [&str; 6] = [
    "product_id",
    "dash_id",
    "dash_library_link",
    "product_url",
    "media_count",
    "media_image_urls",
];

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    /// product_source_id from the feed, renamed in the report.
    pub product_id: String,
    /// Internal Dash product id; empty cell when unmatched.
    pub dash_id: Option<i64>,
    pub dash_library_link: String,
    pub product_url: Option<String>,
    pub media_count: usize,
    /// All original-size image URLs, joined with "; ".
    pub media_image_urls: String,
}

impl ReportRow {
    pub fn from_extraction(product_source_id: &str, info: &ProductInfo, link: String) -> Self {
        Self {
            product_id: product_source_id.to_string(),
            dash_id: info.dash_id,
            dash_library_link: link,
            product_url: info.product_url.clone(),
            media_count: info.media_count,
            media_image_urls: info.image_urls.join("; "),
        }
    }
}

/// Append exactly one row, writing the header only when the file is
/// created. The writer is flushed before returning so the file reflects
/// true progress even if the process is killed mid-run.
pub fn append_row(path: &Path, row: &ReportRow) -> Result<()> {
    let write_header = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {} for append", path.display()))?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if write_header {
        wtr.write_record(REPORT_COLUMNS)?;
    }
    wtr.serialize(row)?;
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Collect the `product_id` values already present in a prior report.
///
/// A header without that column means the file came from an older schema;
/// resume is skipped and those identifiers get reprocessed. A missing file
/// just means a fresh start.
pub fn load_processed(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("reading existing report {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let Some(idx) = headers.iter().position(|h| h == "product_id") else {
        warn!(
            path = %path.display(),
            "existing report has an unexpected header; not resuming from it"
        );
        return Ok(HashSet::new());
    };

    let mut processed = HashSet::new();
    for rec in rdr.records() {
        let rec = match rec {
            Ok(r) => r,
            Err(err) => {
                warn!("skip unreadable report row: {err}");
                continue;
            }
        };
        if let Some(v) = rec.get(idx) {
            processed.insert(v.to_string());
        }
    }
    Ok(processed)
}

/// Deep link into the Dash library filtered down to one product.
///
/// Empty when either piece is missing, which keeps the cell blank for
/// unmatched products.
pub fn build_library_link(base_url: &str, brand_name: &str, dash_id: Option<i64>) -> String {
    let Some(id) = dash_id else {
        return String::new();
    };
    if brand_name.is_empty() {
        return String::new();
    }
    let raw_filter = format!("product|productId:{id}");
    let filter = urlencoding::encode(&raw_filter);
    format!("{base_url}/{brand_name}/library/products?d={filter}")
}
