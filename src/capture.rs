//! Capturing the rendered root document.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File name the captured document is written to inside the output directory.
pub const DOCUMENT_NAME: &str = "index.html";

/// Fetches a document over the network.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch `url` and return the response body untouched.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`DocumentFetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher that ignores any configured HTTP proxy.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| Error::Capture(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a fetcher from an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Capture(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Capture(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Capture(format!("Failed to read body of {}: {}", url, e)))?;

        tracing::debug!(%status, bytes = body.len(), "Fetched document");
        Ok(body.to_vec())
    }
}

/// URL of the root document served on `port`.
pub fn root_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/", port)
}

/// Write `body` verbatim to `{output_dir}/index.html`, replacing any existing file.
pub async fn write_document(output_dir: &Path, body: &[u8]) -> Result<PathBuf> {
    let path = output_dir.join(DOCUMENT_NAME);
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| Error::Capture(format!("Failed to write {}: {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), bytes = body.len(), "Wrote captured document");
    Ok(path)
}
