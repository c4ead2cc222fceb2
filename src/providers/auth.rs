use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde_json::Value;

use super::truncate_for_log;

/// Dash Hudson auth service client.
///
/// One endpoint of interest:
/// - GET /api/self - session introspection; carries the `brands` mapping
///   (brand slug -> brand object) visible to the token.
///
/// Resolution is a startup precondition, so every failure here is fatal to
/// the run; there is nothing to degrade to without a brand slug.
#[derive(Debug, Clone)]
pub struct AuthProvider {
    base_url: String,
    http: Client,
    bearer_token: String,
}

impl AuthProvider {
    pub fn new(base_url: &str, bearer_token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("DashMediaReport/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            bearer_token: bearer_token.to_string(),
        })
    }

    /// Resolve the brand slug whose `brands[slug].id` equals `brand_id`.
    pub async fn resolve_brand_name(&self, brand_id: i64) -> Result<String> {
        let url = format!("{}/api/self", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("calling {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "non-success from /api/self: {status} {}",
                truncate_for_log(body, 512)
            );
        }

        let data: Value = resp.json().await.context("invalid JSON from /api/self")?;
        find_brand_name(&data, brand_id)
            .ok_or_else(|| anyhow!("brand id {brand_id} not found in /api/self response"))
    }
}

fn find_brand_name(data: &Value, brand_id: i64) -> Option<String> {
    let brands = data.get("brands").and_then(Value::as_object)?;
    for (name, brand) in brands {
        if brand.get("id").and_then(Value::as_i64) == Some(brand_id) {
            return Some(name.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_brand_name_matches_id() {
        let data = json!({
            "brands": {
                "sunny-today": { "id": 2005 },
                "acme": { "id": 3001 }
            }
        });
        assert_eq!(find_brand_name(&data, 3001), Some("acme".to_string()));
    }

    #[test]
    fn test_find_brand_name_absent() {
        let data = json!({ "brands": { "acme": { "id": 3001 } } });
        assert_eq!(find_brand_name(&data, 9), None);
        assert_eq!(find_brand_name(&json!({}), 3001), None);
        assert_eq!(find_brand_name(&json!({ "brands": null }), 3001), None);
    }
}
