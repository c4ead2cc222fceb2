//! Pure extraction over fetched media records.
//!
//! The library backend returns loosely-shaped JSON, so traversal is
//! duck-typed: absent nested objects and arrays behave as empty ones.

use serde_json::Value;

/// Product fields derived from one media lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInfo {
    /// Internal Dash product id.
    pub dash_id: Option<i64>,
    /// Canonical product URL (product.url, not product.original_url).
    pub product_url: Option<String>,
    /// Total number of media records fetched, matched or not.
    pub media_count: usize,
    /// Original-size image URL of every record that has one.
    pub image_urls: Vec<String>,
}

fn original_image_url(media: &Value) -> Option<&str> {
    media
        .get("image_sizes")
        .and_then(|s| s.get("original"))
        .and_then(|o| o.get("url"))
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
}

/// A product association matches when its own source id, the nested
/// product's source id, or any of the product's override source ids equals
/// the target.
fn association_matches(tag: &Value, product: Option<&Value>, target: &str) -> bool {
    if tag.get("source_id").and_then(Value::as_str) == Some(target) {
        return true;
    }
    if product.and_then(|p| p.get("source_id")).and_then(Value::as_str) == Some(target) {
        return true;
    }
    product
        .and_then(|p| p.get("product_overrides"))
        .and_then(Value::as_array)
        .map_or(false, |overrides| {
            overrides
                .iter()
                .any(|ov| ov.get("source_id").and_then(Value::as_str) == Some(target))
        })
}

/// Scan the media records for the product matching `product_source_id`.
///
/// Image URLs are collected from every record regardless of match status.
/// Once both the dash id and the product URL are found, later records are
/// no longer searched for matches (they still contribute images); scanning
/// them anyway would not change the result. Associations are checked in
/// order and the first match within a record wins.
pub fn extract_product_info(media_items: &[Value], product_source_id: &str) -> ProductInfo {
    let mut dash_id: Option<i64> = None;
    let mut product_url: Option<String> = None;
    let mut image_urls: Vec<String> = Vec::new();

    for media in media_items {
        if let Some(url) = original_image_url(media) {
            image_urls.push(url.to_string());
        }

        // once we have product info we can skip searching
        if dash_id.is_some() && product_url.is_some() {
            continue;
        }

        let Some(tags) = media.get("products").and_then(Value::as_array) else {
            continue;
        };
        for tag in tags {
            let product = tag.get("product").filter(|p| !p.is_null());
            if !association_matches(tag, product, product_source_id) {
                continue;
            }
            if dash_id.is_none() {
                dash_id = product
                    .and_then(|p| p.get("id"))
                    .and_then(Value::as_i64)
                    .or_else(|| tag.get("product_id").and_then(Value::as_i64));
            }
            if product_url.is_none() {
                product_url = product
                    .and_then(|p| p.get("url"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            break;
        }
    }

    ProductInfo {
        dash_id,
        product_url,
        media_count: media_items.len(),
        image_urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image_only(url: &str) -> Value {
        json!({ "image_sizes": { "original": { "url": url } } })
    }

    #[test]
    fn test_empty_media_list() {
        let info = extract_product_info(&[], "src-1");
        assert_eq!(info, ProductInfo::default());
    }

    #[test]
    fn test_match_on_tag_source_id() {
        let media = vec![json!({
            "products": [{
                "source_id": "src-1",
                "product": { "id": 7, "url": "https://x/p/7" }
            }]
        })];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, Some(7));
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/7"));
        assert_eq!(info.media_count, 1);
    }

    #[test]
    fn test_match_on_product_source_id() {
        let media = vec![json!({
            "products": [{
                "source_id": "other",
                "product": { "id": 8, "source_id": "src-1", "url": "https://x/p/8" }
            }]
        })];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, Some(8));
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/8"));
    }

    #[test]
    fn test_match_on_override_source_id() {
        let media = vec![json!({
            "products": [{
                "product": {
                    "id": 9,
                    "url": "https://x/p/9",
                    "product_overrides": [
                        { "source_id": "legacy-1" },
                        { "source_id": "src-1" }
                    ]
                }
            }]
        })];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, Some(9));
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/9"));
    }

    #[test]
    fn test_dash_id_falls_back_to_tag_product_id() {
        let media = vec![json!({
            "products": [{
                "source_id": "src-1",
                "product_id": 41,
                "product": { "url": "https://x/p/41" }
            }]
        })];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, Some(41));
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/41"));
    }

    #[test]
    fn test_product_url_ignores_original_url() {
        let media = vec![json!({
            "products": [{
                "source_id": "src-1",
                "product": {
                    "id": 5,
                    "url": "https://x/p/5",
                    "original_url": "https://feed.example/item/5"
                }
            }]
        })];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/5"));
    }

    #[test]
    fn test_first_matching_association_wins() {
        let media = vec![json!({
            "products": [
                { "source_id": "src-1", "product": { "id": 1, "url": "https://x/p/1" } },
                { "source_id": "src-1", "product": { "id": 2, "url": "https://x/p/2" } }
            ]
        })];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, Some(1));
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/1"));
    }

    #[test]
    fn test_match_in_third_record_counts_all() {
        let media = vec![
            image_only("https://cdn/img1.jpg"),
            image_only("https://cdn/img2.jpg"),
            json!({
                "image_sizes": { "original": { "url": "https://cdn/img3.jpg" } },
                "products": [{
                    "source_id": "src-42",
                    "product": { "id": 42, "url": "https://x/p/42" }
                }]
            }),
        ];
        let info = extract_product_info(&media, "src-42");
        assert_eq!(info.dash_id, Some(42));
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/42"));
        assert_eq!(info.media_count, 3);
        assert_eq!(
            info.image_urls,
            vec![
                "https://cdn/img1.jpg".to_string(),
                "https://cdn/img2.jpg".to_string(),
                "https://cdn/img3.jpg".to_string()
            ]
        );
    }

    #[test]
    fn test_no_match_still_collects_images() {
        let media = vec![
            image_only("https://cdn/a.jpg"),
            json!({
                "image_sizes": { "original": { "url": "https://cdn/b.jpg" } },
                "products": [{ "source_id": "someone-else" }]
            }),
        ];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, None);
        assert_eq!(info.product_url, None);
        assert_eq!(info.media_count, 2);
        assert_eq!(info.image_urls.len(), 2);
    }

    #[test]
    fn test_images_still_collected_after_match() {
        let media = vec![
            json!({
                "image_sizes": { "original": { "url": "https://cdn/first.jpg" } },
                "products": [{
                    "source_id": "src-1",
                    "product": { "id": 3, "url": "https://x/p/3" }
                }]
            }),
            image_only("https://cdn/second.jpg"),
        ];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, Some(3));
        assert_eq!(info.image_urls.len(), 2);
    }

    #[test]
    fn test_later_record_fills_missing_url() {
        // First match carries an id but no url; the search keeps going and a
        // later record supplies the url.
        let media = vec![
            json!({
                "products": [{ "source_id": "src-1", "product": { "id": 4 } }]
            }),
            json!({
                "products": [{ "source_id": "src-1", "product": { "id": 99, "url": "https://x/p/4" } }]
            }),
        ];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, Some(4));
        assert_eq!(info.product_url.as_deref(), Some("https://x/p/4"));
    }

    #[test]
    fn test_missing_nested_structures_do_not_panic() {
        let media = vec![
            json!({}),
            json!({ "image_sizes": null, "products": null }),
            json!({ "image_sizes": { "original": null } }),
            json!({ "image_sizes": { "original": { "url": "" } } }),
            json!({ "products": [ {}, { "product": null }, { "product": { "product_overrides": null } } ] }),
        ];
        let info = extract_product_info(&media, "src-1");
        assert_eq!(info.dash_id, None);
        assert_eq!(info.product_url, None);
        assert_eq!(info.media_count, 5);
        assert!(info.image_urls.is_empty());
    }
}
