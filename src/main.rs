// src/main.rs
use blog_migrator::extractors::article::{process_article, ArticleRecord};
use blog_migrator::extractors::spatial::{select_block, AttributeGeometry, Rect};
use blog_migrator::extractors::segmenter::find_content_root;
use blog_migrator::fetch::{normalize_url, PageFetcher};
use blog_migrator::render::{render_block, Environment};
use blog_migrator::storage::csv::DEFAULT_CSV_FILENAME;
use blog_migrator::storage::StorageManager;
use blog_migrator::utils::{self, AppError};
use blog_migrator::MigrationConfig;
use clap::Parser;
use scraper::Html;
use std::path::PathBuf;

/// Command Line Interface for the legacy blog migrator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Article sources: local HTML files or http(s) URLs (a bare host gets https://)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory for rendered articles and metadata
    #[arg(short, long, default_value = "./output")]
    output_dir: PathBuf,

    /// Target storefront environment for site and CDN URLs
    #[arg(short, long, env = "BLOG_MIGRATOR_ENV", default_value = "production")]
    environment: Environment,

    /// JSON file overriding the built-in staging/production base URLs
    #[arg(long)]
    env_map: Option<PathBuf>,

    /// Additional legacy blog hosts whose links become site-relative
    #[arg(long = "legacy-host", env = "BLOG_MIGRATOR_LEGACY_HOST", value_delimiter = ',')]
    legacy_hosts: Vec<String>,

    /// Write a Matrixify import CSV for the whole batch
    #[arg(long)]
    csv: bool,

    /// Extract only the region x,y,width,height using data-bbox geometry
    #[arg(long)]
    select: Option<Rect>,

    /// Delay between page fetches in milliseconds
    #[arg(long, default_value_t = blog_migrator::fetch::client::DEFAULT_DELAY_MS)]
    delay_ms: u64,

    /// Fetch timeout in seconds
    #[arg(long, default_value_t = blog_migrator::fetch::client::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Debug mode - save a colour-coded block report per article
    #[arg(short, long)]
    debug: bool,

    /// Debug-level logging for this crate (RUST_LOG still wins)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<(MigrationConfig, Vec<String>), AppError> {
        let mut config = MigrationConfig::new(self.output_dir).with_legacy_hosts(self.legacy_hosts);
        if let Some(path) = &self.env_map {
            config = config.with_environment_map_file(path)?;
        }
        config.environment = self.environment;
        config.csv_filename = self.csv.then(|| DEFAULT_CSV_FILENAME.to_string());
        config.selection = self.select;
        config.delay_ms = self.delay_ms;
        config.fetch_timeout_secs = self.timeout_secs;
        config.debug = self.debug;
        Ok((config, self.inputs))
    }
}

fn is_remote(input: &str) -> bool {
    let path = std::path::Path::new(input);
    !path.exists()
}

/// Reads the page source, from disk or over the network.
async fn load_source(input: &str, fetcher: &PageFetcher) -> Result<(String, String), AppError> {
    if !is_remote(input) {
        let html = std::fs::read_to_string(input)?;
        return Ok((html, input.to_string()));
    }
    let url = normalize_url(input)?;
    let page = fetcher.fetch_page(&url).await?;
    Ok((page.html, page.final_url))
}

/// Region extraction: one block from the content root under `rect`.
fn process_selection(html: &str, url: &str, rect: Rect, config: &MigrationConfig) -> ArticleRecord {
    let document = Html::parse_document(html);
    let root = find_content_root(&document).unwrap_or_else(|| document.root_element());
    match select_block(&root, rect, &AttributeGeometry) {
        Some(block) => {
            let mut record = ArticleRecord::for_url(url);
            record.html = render_block(&block, &config.render);
            record.blocks = vec![block];
            record
        }
        None => ArticleRecord::failed(url, format!("Selection {:?} matched no content", rect)),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments, then set up logging (reads RUST_LOG env var)
    let args = Args::parse();
    utils::logging::setup_logging(args.verbose);
    tracing::info!("Starting migration for args: {:?}", args);

    // 2. Resolve configuration
    let (config, inputs) = args.into_config()?;

    // 3. Initialize storage and fetcher
    let storage = StorageManager::new(&config.output_dir)?;
    tracing::info!("Writing migrated articles to {}", storage.base_dir().display());
    let fetcher = PageFetcher::new(config.fetch_timeout_secs, config.delay_ms)?;

    // 4. Process each article; one failure never aborts the batch
    let mut records = Vec::new();
    let mut success_count = 0;
    let mut failure_count = 0;

    for (index, input) in inputs.iter().enumerate() {
        if index > 0 && is_remote(input) {
            fetcher.pause().await;
        }
        tracing::info!("Processing article {}/{}: {}", index + 1, inputs.len(), input);

        let (html, url) = match load_source(input, &fetcher).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("Failed to load {}: {}", input, e);
                failure_count += 1;
                records.push(ArticleRecord::failed(input, e.to_string()));
                continue;
            }
        };

        let mut record = match config.selection {
            Some(rect) => process_selection(&html, &url, rect, &config),
            None => process_article(&html, &url, &config.render),
        };
        record.html = config.finalize_html(&record.html);

        if let Some(error) = &record.error {
            tracing::error!("Failed to migrate {}: {}", url, error);
            failure_count += 1;
        } else {
            success_count += 1;
            match storage.save_article_html(&record) {
                Ok(path) => tracing::info!("Saved article HTML to: {}", path.display()),
                Err(e) => tracing::error!("Failed to save article HTML: {}", e),
            }
        }

        match storage.save_article_metadata(&record) {
            Ok(path) => tracing::info!("Saved article metadata to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save article metadata: {}", e),
        }

        if config.debug {
            let saved = utils::html_debug::debug_report(&html, &record.blocks, &config.render)
                .and_then(|report| {
                    storage
                        .save_article_file(&record, "debug_report.html", &report)
                        .map_err(AppError::from)
                });
            match saved {
                Ok(path) => tracing::info!("Created debug report: {}", path.display()),
                Err(e) => tracing::warn!("Failed to create debug report: {}", e),
            }
        }

        records.push(record);
    }

    // 5. Batch CSV
    if let Some(filename) = &config.csv_filename {
        match storage.save_csv(&records, filename) {
            Ok(path) => tracing::info!("Saved CSV to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save CSV: {}", e),
        }
    }

    tracing::info!("Migration finished. Success: {}, Failures: {}", success_count, failure_count);

    if success_count == 0 && failure_count > 0 {
        return Err(AppError::Processing(format!("Failed to migrate any of {} articles", failure_count)));
    }

    Ok(())
}
