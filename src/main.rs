use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use dash_media_report::config::{Config, Overrides};
use dash_media_report::extract::extract_product_info;
use dash_media_report::input::read_product_source_ids;
use dash_media_report::providers::auth::AuthProvider;
use dash_media_report::providers::library::LibraryProvider;
use dash_media_report::report::{append_row, build_library_link, load_processed, ReportRow};
use dash_media_report::util::env as env_util;

#[derive(Parser, Debug)]
#[command(
    name = "media-report",
    version,
    about = "Builds a resumable CSV report of Dash library media per product source id"
)]
struct Cli {
    /// Input CSV with a product_source_id column (overrides INPUT_CSV_PATH)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output report CSV, created or appended (overrides OUTPUT_CSV_PATH)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Brand id to resolve and query under (overrides BRAND_ID)
    #[arg(long)]
    brand_id: Option<i64>,
    /// Delay between media lookups in milliseconds (overrides REQUEST_DELAY_MS)
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Cap on identifiers processed this run, skips excluded (overrides REPORT_LIMIT)
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    dash_media_report::tracing::init_tracing("info")?;

    let cli = Cli::parse();
    let _ = env_util::preflight_check(
        "media-report",
        &[],
        &[
            "BRAND_ID",
            "BEARER_TOKEN",
            "INPUT_CSV_PATH",
            "OUTPUT_CSV_PATH",
            "REQUEST_DELAY_MS",
            "HTTP_TIMEOUT_SECS",
            "REPORT_LIMIT",
        ],
    );

    let cfg = Config::from_env(&Overrides {
        brand_id: cli.brand_id,
        input: cli.input,
        output: cli.output,
        delay_ms: cli.delay_ms,
        limit: cli.limit,
    })?;

    run(cfg).await
}

async fn run(cfg: Config) -> Result<()> {
    // Startup preconditions: everything up to the first media lookup is
    // fatal on failure.
    let auth = AuthProvider::new(&cfg.auth_base_url, &cfg.bearer_token, cfg.http_timeout)?;
    info!(brand_id = cfg.brand_id, "resolving brand name via /api/self");
    let brand_name = auth.resolve_brand_name(cfg.brand_id).await?;
    info!(brand_name = %brand_name, "using brand");

    let product_source_ids = read_product_source_ids(&cfg.input_csv)?;
    println!(
        "found {} product_source_id values in {}",
        product_source_ids.len(),
        cfg.input_csv.display()
    );

    let processed = load_processed(&cfg.output_csv)?;
    if !processed.is_empty() {
        println!(
            "resuming: {} product ids already in {}",
            processed.len(),
            cfg.output_csv.display()
        );
    }

    let library = LibraryProvider::new(
        &cfg.library_backend_base_url,
        &cfg.bearer_token,
        cfg.brand_id,
        cfg.http_timeout,
    )?;

    let mut done = 0usize;
    let mut skipped = 0usize;
    let mut errors = 0usize;

    for (idx, product_source_id) in product_source_ids.iter().enumerate() {
        let n = idx + 1;
        if processed.contains(product_source_id) {
            info!("[{n}] skipping {product_source_id} (already processed)");
            skipped += 1;
            continue;
        }
        if let Some(limit) = cfg.limit {
            if done >= limit {
                println!("stopping at limit {limit}; re-run to continue");
                break;
            }
        }

        info!("[{n}] fetching media for {product_source_id}");
        let media_items = match library.fetch_media(product_source_id).await {
            Ok(items) => items,
            Err(err) => {
                // Degrade to a zero-media row; the batch keeps going.
                warn!("[{n}] media lookup failed for {product_source_id}: {err:#}");
                errors += 1;
                Vec::new()
            }
        };

        let extracted = extract_product_info(&media_items, product_source_id);
        let link = build_library_link(&cfg.library_base_url, &brand_name, extracted.dash_id);
        let row = ReportRow::from_extraction(product_source_id, &extracted, link);
        append_row(&cfg.output_csv, &row)?;
        done += 1;

        tokio::time::sleep(cfg.request_delay).await;
    }

    println!("media report complete: processed={done}, skipped={skipped}, errors={errors}");
    println!("rows were saved incrementally; safe to interrupt and resume");
    Ok(())
}
