//! Collector entry point: scrape faculty pages and write cleaned page files.

use minirag::core::config::Settings;
use minirag::core::logging;
use minirag::core::paths::AppPaths;
use minirag::scraper::{collect_pages, save_pages, FirecrawlClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let paths = AppPaths::new();
    logging::init(&paths);

    let settings = Settings::from_env();
    tracing::info!("Starting scraper pipeline V{}", settings.pipeline.version);

    let client = FirecrawlClient::new(
        &settings.firecrawl_base_url,
        settings.firecrawl_api_key.as_deref(),
    )?;

    let pages = collect_pages(&client, &settings.pipeline).await;
    let written = save_pages(&paths, &pages)?;

    tracing::info!(
        "Successfully saved {} pages to {}",
        written.len(),
        paths.scraped_raw_dir.display()
    );

    Ok(())
}
