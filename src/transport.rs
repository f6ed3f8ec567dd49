//! HTTP access to the publisher's site

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::config::Config;
use crate::errors::{ArchiveError, Result};

/// The two kinds of request the pipeline makes
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a page body as text
    async fn get_text(&self, url: &str) -> Result<String>;

    /// Stream a response body into `sink`, returning the byte count
    async fn download(&self, url: &str, sink: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64>;
}

/// reqwest-backed transport carrying the configured user agent
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;
        Ok(HttpTransport { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.get(url).await?.text().await?)
    }

    async fn download(&self, url: &str, sink: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64> {
        let response = self.get(url).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        Ok(written)
    }
}
