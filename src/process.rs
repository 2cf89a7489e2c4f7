use std::sync::Arc;

use chrono::Local;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::ScrapeConfig;
use crate::dataset::spawn_writer;
use crate::parse::{parse_listing, ExtractOptions};
use crate::record::ListingRecord;
use crate::request::{request_links, Fetcher, HttpFetcher};
use crate::{error_time, info_time, Error, Result, RECORD_CHANNEL_CAPACITY};

/// What a finished run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub links: usize,
    pub records: usize,
    pub failed: usize,
}

/// Crawls the site over HTTP with the given configuration.
pub async fn process_site(config: &ScrapeConfig) -> Result<RunSummary> {
    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
    process_with(fetcher, config).await
}

/// Runs every batch through `fetcher`, appending records to `config.output`.
/// Failed pages and listings are logged and skipped; a failed append ends the run.
pub async fn process_with<F: Fetcher>(fetcher: Arc<F>, config: &ScrapeConfig) -> Result<RunSummary> {
    config.validate()?;
    let start_time = Local::now();
    info_time!(
        "Started scraping {} pages, {} per batch, into {}",
        config.total_pages,
        config.pages_per_batch,
        config.output.display()
    );

    let (record_tx, writer_handle) = spawn_writer(config.output.clone(), RECORD_CHANNEL_CAPACITY);
    let opts = ExtractOptions {
        type_of_sale: config.type_of_sale.clone(),
        missing_as_false: config.missing_as_false,
    };

    let mut summary = RunSummary::default();
    let crawl = crawl_batches(fetcher, config, &opts, record_tx, &mut summary).await;

    // The record sender went away with `crawl_batches`, so the writer drains and finishes.
    let written = writer_handle.await?;
    // A writer failure explains a failed send, so it takes precedence.
    summary.records = written?;
    crawl?;

    info_time!(
        start_time,
        "Finished: {} pages, {} links, {} records, {} failed",
        summary.pages,
        summary.links,
        summary.records,
        summary.failed
    );
    Ok(summary)
}

async fn crawl_batches<F: Fetcher>(
    fetcher: Arc<F>,
    config: &ScrapeConfig,
    opts: &ExtractOptions,
    record_tx: mpsc::Sender<ListingRecord>,
    summary: &mut RunSummary,
) -> Result<()> {
    for pages in config.batches() {
        // The writer is gone; its error is reported once it is awaited.
        if record_tx.is_closed() {
            error_time!("Dataset writer stopped, skipping pages {}..", pages.start);
            return Err(Error::RuntimeSendError);
        }
        let start_batch_time = Local::now();
        summary.pages += pages.len();

        let links = request_links(fetcher.clone(), &config.base_url, pages.clone(), config.link_workers).await?;
        summary.links += links.len();
        info_time!("Batch {}..{}: {} links", pages.start, pages.end, links.len());

        summary.failed += scrape_links(fetcher.clone(), links, opts, config.listing_workers, &record_tx).await?;
        info_time!(start_batch_time, "Processed batch {}..{}", pages.start, pages.end);
    }
    Ok(())
}

/// Fetches and extracts every link, at most `width` at a time, and hands records to the writer.
/// Returns how many listings were skipped.
async fn scrape_links<F: Fetcher>(
    fetcher: Arc<F>,
    links: Vec<String>,
    opts: &ExtractOptions,
    width: usize,
    record_tx: &mpsc::Sender<ListingRecord>,
) -> Result<usize> {
    let permits = Arc::new(Semaphore::new(width));
    let mut task_set = JoinSet::new();

    for url in links {
        task_set.spawn({
            let fetcher = fetcher.clone();
            let permits = permits.clone();
            let opts = opts.clone();

            async move {
                let _permit = permits.acquire_owned().await;
                let record = scrape_listing(fetcher.as_ref(), &url, opts).await;
                (url, record)
            }
        });
    }

    let mut failed = 0;
    while let Some(task) = task_set.join_next().await {
        let (url, record) = task?;
        match record {
            Ok(record) => record_tx.send(record).await?,
            Err(e) => {
                error_time!("Skipping {}: {}", url, e);
                failed += 1;
            }
        }
    }
    Ok(failed)
}

async fn scrape_listing<F: Fetcher>(fetcher: &F, url: &str, opts: ExtractOptions) -> Result<ListingRecord> {
    let html = fetcher.fetch(url).await?;
    parse_listing(html, url.to_string(), opts).await
}
