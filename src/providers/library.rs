use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::Value;

use super::truncate_for_log;

/// Library-backend client for per-product media lookups.
///
/// Endpoint:
/// - GET /public/brands/{brand_id}/products/media?product_source_id=...
///
/// Errors are returned to the caller, which degrades them to an empty
/// record list; one identifier failing must not halt the batch.
#[derive(Debug, Clone)]
pub struct LibraryProvider {
    base_url: String,
    http: Client,
    bearer_token: String,
    brand_id: i64,
}

impl LibraryProvider {
    pub fn new(
        base_url: &str,
        bearer_token: &str,
        brand_id: i64,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent("DashMediaReport/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            bearer_token: bearer_token.to_string(),
            brand_id,
        })
    }

    /// Fetch the media records tagged with the given product source id.
    ///
    /// A JSON body that is valid but not an array yields an empty list.
    pub async fn fetch_media(&self, product_source_id: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/public/brands/{}/products/media",
            self.base_url, self.brand_id
        );
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("product_source_id", product_source_id)])
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("non-success ({status}): {}", truncate_for_log(body, 512));
        }

        let data: Value = resp
            .json()
            .await
            .with_context(|| format!("JSON parse error for {product_source_id}"))?;
        match data {
            Value::Array(items) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }
}
