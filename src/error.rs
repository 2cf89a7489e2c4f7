use thiserror::Error;
use tokio::sync::mpsc;

use crate::record::ListingRecord;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),
    #[error("Invalid run configuration: {0}")]
    InvalidBatch(String),
    #[error("Dataset row {row} has {found} cells but the header has {expected}")]
    DatasetRowTooLong { row: usize, found: usize, expected: usize },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Csv Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
    #[error("Couldn't send a record through a channel.")]
    RuntimeSendError,

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },
}

impl From<mpsc::error::SendError<ListingRecord>> for Error {
    fn from(_value: mpsc::error::SendError<ListingRecord>) -> Self {
        Error::RuntimeSendError
    }
}
