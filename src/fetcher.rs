//! Idempotent, paced download of one page PDF

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::errors::{ArchiveError, Result};
use crate::pacer::Pacer;
use crate::transport::Transport;

/// Write buffer size; the body is never held in memory as a whole
pub const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Downloaded { bytes: u64 },
    AlreadyPresent,
}

pub struct Fetcher {
    transport: Arc<dyn Transport>,
    pacer: Pacer,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, pacer: Pacer) -> Self {
        Fetcher { transport, pacer }
    }

    /// Download `url` to `destination` unless a complete file is already there.
    ///
    /// The body goes to a `.part` sibling first and is renamed into place once
    /// fully written, so anything at `destination` is a finished download.
    pub async fn fetch(&self, url: &str, destination: &Path) -> Result<FetchStatus> {
        if is_complete(destination).await {
            info!("{} already exists, skipping download", destination.display());
            return Ok(FetchStatus::AlreadyPresent);
        }

        self.pacer.ready().await;
        info!("Downloading {} to {}", url, destination.display());

        let partial = partial_path(destination);
        let bytes = match self.download_to(url, &partial).await {
            Ok(bytes) => {
                self.pacer.completed();
                bytes
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&partial).await {
                    debug!("No partial file to remove at {}: {}", partial.display(), cleanup);
                }
                return Err(e);
            }
        };

        fs::rename(&partial, destination).await?;
        info!("{} downloaded ({} bytes)", destination.display(), bytes);
        Ok(FetchStatus::Downloaded { bytes })
    }

    async fn download_to(&self, url: &str, partial: &Path) -> Result<u64> {
        let file = fs::File::create(partial).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

        let bytes = self.transport.download(url, &mut writer).await?;
        writer.flush().await?;

        if bytes == 0 {
            return Err(ArchiveError::EmptyBody(url.to_string()));
        }
        Ok(bytes)
    }
}

async fn is_complete(path: &Path) -> bool {
    matches!(fs::metadata(path).await, Ok(meta) if meta.is_file() && meta.len() > 0)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
