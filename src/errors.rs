//! Error types for the fetch-merge pipeline

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("No PDF link found on detail page {0}")]
    MissingLink(String),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("PDF error in {path}: {source}")]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("No pages found in {0}")]
    NoPages(PathBuf),

    #[error("None of the {0} input files could be merged")]
    NothingToMerge(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        ArchiveError::InvalidUrl {
            url: url.into(),
            source,
        }
    }
}

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
