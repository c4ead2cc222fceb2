//! Run configuration, built once at startup and passed to each component.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};

use crate::util::env::{env_opt, env_parse, env_parse_opt};

/// Tokens shipped in the .env template; treated the same as no token at all.
const PLACEHOLDER_TOKEN: &str = "YOUR_BEARER_TOKEN_HERE";

const DEFAULT_LIBRARY_BASE_URL: &str = "https://app.dashhudson.com";
const DEFAULT_LIBRARY_BACKEND_BASE_URL: &str = "https://library-backend.dashhudson.com";
const DEFAULT_AUTH_BASE_URL: &str = "https://auth.dashhudson.com";

/// CLI flag values layered on top of the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub brand_id: Option<i64>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub delay_ms: Option<u64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Numeric brand id the report is scoped to.
    pub brand_id: i64,
    /// Dash Hudson API bearer token.
    pub bearer_token: String,
    /// Input CSV; must contain a `product_source_id` column.
    pub input_csv: PathBuf,
    /// Output report CSV, created on first write and appended thereafter.
    pub output_csv: PathBuf,
    /// Pause between media lookups (courtesy to the remote service).
    pub request_delay: Duration,
    /// Per-call HTTP timeout.
    pub http_timeout: Duration,
    /// Optional cap on identifiers processed in one run (skips excluded).
    pub limit: Option<usize>,
    pub library_base_url: String,
    pub library_backend_base_url: String,
    pub auth_base_url: String,
}

impl Config {
    /// Build from environment (with dotenv honored), applying CLI overrides
    /// on top. Token and brand id problems are fatal here, before any
    /// network or file work starts.
    pub fn from_env(overrides: &Overrides) -> Result<Self> {
        let brand_id = overrides
            .brand_id
            .or_else(|| env_parse_opt("BRAND_ID"))
            .ok_or_else(|| anyhow!("BRAND_ID not set (env, .env, or --brand-id)"))?;

        let bearer_token = env_opt("BEARER_TOKEN").unwrap_or_default();
        if !token_is_usable(&bearer_token) {
            bail!("set BEARER_TOKEN to a real Dash Hudson API token (env or .env)");
        }

        let input_csv = overrides
            .input
            .clone()
            .or_else(|| env_opt("INPUT_CSV_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("product_source_ids.csv"));
        let output_csv = overrides
            .output
            .clone()
            .or_else(|| env_opt("OUTPUT_CSV_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("product_media_report.csv"));

        let delay_ms = overrides
            .delay_ms
            .unwrap_or_else(|| env_parse("REQUEST_DELAY_MS", 200u64));
        let timeout_secs: u64 = env_parse("HTTP_TIMEOUT_SECS", 30u64);
        let limit = overrides.limit.or_else(|| env_parse_opt("REPORT_LIMIT"));

        Ok(Self {
            brand_id,
            bearer_token,
            input_csv,
            output_csv,
            request_delay: Duration::from_millis(delay_ms),
            http_timeout: Duration::from_secs(timeout_secs),
            limit,
            library_base_url: base_url("LIBRARY_BASE_URL", DEFAULT_LIBRARY_BASE_URL),
            library_backend_base_url: base_url(
                "LIBRARY_BACKEND_BASE_URL",
                DEFAULT_LIBRARY_BACKEND_BASE_URL,
            ),
            auth_base_url: base_url("AUTH_BASE_URL", DEFAULT_AUTH_BASE_URL),
        })
    }
}

fn base_url(key: &str, default: &str) -> String {
    env_opt(key)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn token_is_usable(token: &str) -> bool {
    let t = token.trim();
    !t.is_empty() && t != PLACEHOLDER_TOKEN
}
