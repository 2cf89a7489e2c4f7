use chrono::Local;
use clap::Parser;
use immo_scrap::{config::ScrapeConfig, info_time, process::process_site, Result};

/// Scrape Immoweb listings into a CSV file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of search result pages to crawl
    #[arg(default_value_t = 50)]
    total_pages: usize,

    /// Pages whose listings are scraped together
    #[arg(default_value_t = 1)]
    pages_per_batch: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let start_time = Local::now();

    let config = ScrapeConfig::default().with_pages(args.total_pages, args.pages_per_batch);
    process_site(&config).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}
