use std::future::Future;
use std::ops::Range;
use std::sync::Arc;

use reqwest::{header, Client};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::parse::parse_links;
use crate::{error_time, info_time, Error, Result};

/// Anything that can turn a URL into a page body.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// `reqwest` backed fetcher. Every request carries the same User-Agent; no retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let res = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html")
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = res.text().await?;
        Ok(html)
    }
}

/// Search results page `page_num`, most relevant first.
pub fn search_url(base_url: &str, page_num: usize) -> String {
    format!("{base_url}&page={page_num}&orderBy=relevance")
}

/// Fetches a search results page and returns the listing links on it.
pub async fn get_links<F: Fetcher>(fetcher: &F, base_url: &str, page_num: usize) -> Result<Vec<String>> {
    let html = fetcher.fetch(&search_url(base_url, page_num)).await?;
    parse_links(html).await
}

/// Enumerates links for every page in `pages`, at most `width` requests at a time.
/// A page that fails is logged and contributes nothing.
pub async fn request_links<F: Fetcher>(
    fetcher: Arc<F>,
    base_url: &str,
    pages: Range<usize>,
    width: usize,
) -> Result<Vec<String>> {
    info_time!("Requesting pages {}..{}", pages.start, pages.end);

    let permits = Arc::new(Semaphore::new(width));
    let mut task_set = JoinSet::new();

    for page_num in pages {
        task_set.spawn({
            // Fetcher and semaphore are behind an Arc so we can clone cheaply
            let fetcher = fetcher.clone();
            let permits = permits.clone();
            let base_url = base_url.to_string();

            async move {
                let _permit = permits.acquire_owned().await;
                let links = get_links(fetcher.as_ref(), &base_url, page_num).await;
                (page_num, links)
            }
        });
    }

    let mut all_links = Vec::new();
    while let Some(task) = task_set.join_next().await {
        let (page_num, links) = task?;
        match links {
            Ok(links) => {
                info_time!("Page {}: {} links", page_num, links.len());
                all_links.extend(links);
            }
            Err(e) => error_time!("Couldn't fetch links for page {}: {}", page_num, e),
        }
    }
    Ok(all_links)
}
