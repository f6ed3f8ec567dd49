//! Daily People's Daily PDF archiver: resolve page links, download each page,
//! merge the day into one PDF.

pub mod archiver;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod locator;
pub mod merger;
pub mod models;
pub mod pacer;
pub mod storage;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use archiver::Archiver;
pub use errors::{ArchiveError, Result};
