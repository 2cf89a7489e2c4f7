//! Scrapes real-estate listings off Immoweb search results into a CSV dataset.
//!
//! Search pages are walked in batches, every listing found is fetched and reduced
//! to a [`record::ListingRecord`], and records are appended to the dataset by a
//! single writer task.

pub mod config;
pub mod dataset;
mod error;
mod macros;
pub mod normalize;
pub mod parse;
pub mod process;
pub mod record;
pub mod request;

pub use error::{Error, Result};

const BASE_URL: &str = "https://www.immoweb.be/en/search/house/for-sale?countries=BE";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const OUTPUT_FILE: &str = "all.csv";
const TOTAL_PAGES: usize = 50;
const PAGES_PER_BATCH: usize = 1;
const LINK_WORKERS: usize = 10;
const LISTING_WORKERS: usize = 4;
const TYPE_OF_SALE: &str = "sale";
const RECORD_CHANNEL_CAPACITY: usize = 256;
