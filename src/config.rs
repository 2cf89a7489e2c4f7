use std::path::PathBuf;

use crate::{
    Error, Result, BASE_URL, LINK_WORKERS, LISTING_WORKERS, OUTPUT_FILE, PAGES_PER_BATCH,
    TOTAL_PAGES, TYPE_OF_SALE, USER_AGENT,
};

/// Everything a run needs to know. `Default` gives the stock houses-for-sale crawl.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub user_agent: String,
    pub output: PathBuf,
    pub total_pages: usize,
    pub pages_per_batch: usize,
    /// Max search pages requested at once.
    pub link_workers: usize,
    /// Max listing pages fetched and extracted at once.
    pub listing_workers: usize,
    pub type_of_sale: String,
    /// Write `false` instead of an empty cell for fields missing from the listing JSON.
    pub missing_as_false: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            output: PathBuf::from(OUTPUT_FILE),
            total_pages: TOTAL_PAGES,
            pages_per_batch: PAGES_PER_BATCH,
            link_workers: LINK_WORKERS,
            listing_workers: LISTING_WORKERS,
            type_of_sale: TYPE_OF_SALE.to_string(),
            missing_as_false: false,
        }
    }
}

impl ScrapeConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_pages(mut self, total_pages: usize, pages_per_batch: usize) -> Self {
        self.total_pages = total_pages;
        self.pages_per_batch = pages_per_batch;
        self
    }

    pub fn with_workers(mut self, link_workers: usize, listing_workers: usize) -> Self {
        self.link_workers = link_workers;
        self.listing_workers = listing_workers;
        self
    }

    pub fn with_type_of_sale(mut self, type_of_sale: impl Into<String>) -> Self {
        self.type_of_sale = type_of_sale.into();
        self
    }

    pub fn with_missing_as_false(mut self, missing_as_false: bool) -> Self {
        self.missing_as_false = missing_as_false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.pages_per_batch == 0 {
            return Err(Error::InvalidBatch("pages_per_batch must be at least 1".into()));
        }
        if self.link_workers == 0 || self.listing_workers == 0 {
            return Err(Error::InvalidBatch("worker pools need at least 1 worker".into()));
        }
        Ok(())
    }

    /// Splits `0..total_pages` into consecutive batches of `pages_per_batch` pages.
    pub fn batches(&self) -> Vec<std::ops::Range<usize>> {
        (0..self.total_pages)
            .step_by(self.pages_per_batch.max(1))
            .map(|start| start..(start + self.pages_per_batch).min(self.total_pages))
            .collect()
    }
}
