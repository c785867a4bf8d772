use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

/// A remote EPUB fetched over HTTP(S).
///
/// When the server advertises `Accept-Ranges: bytes` the body is fetched with
/// Range requests, so a dropped connection resumes from the last received
/// byte instead of starting over. Servers without range support are fetched
/// with a single plain GET.
pub struct HttpSource {
    client: Client,
    url: String,
    size: Option<u64>,
    ranged: bool,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpSource {
    /// Probe the remote file with a HEAD request.
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let resp = client.head(&url).send().await?;

        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let ranged = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));

        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        tracing::debug!(url = %url, ?size, ranged, "probed remote source");

        Ok(Self {
            client,
            url,
            size,
            ranged: ranged && size.is_some(),
            transferred_bytes: AtomicU64::new(0),
            max_retry: 10,
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Download the whole body into memory.
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        if self.ranged {
            return self.read_all().await;
        }

        let mut retry_count = 0;
        loop {
            match self.client.get(&self.url).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }
                    let bytes = resp.bytes().await?;
                    self.transferred_bytes
                        .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                    return Ok(bytes.to_vec());
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    self.backoff(retry_count, &e).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn backoff(&self, retry_count: u32, err: &reqwest::Error) -> Result<()> {
        if retry_count >= self.max_retry {
            bail!("Max retries exceeded");
        }
        tracing::warn!(
            "Connection error, retry {}/{}: {}",
            retry_count,
            self.max_retry,
            err
        );
        tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
        Ok(())
    }
}

#[async_trait]
impl ReadAt for HttpSource {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.ranged {
            bail!("Remote server does not support Range requests");
        }
        let size = self
            .size
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;
        if offset >= size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(size - 1);
        let expected_size = (end - offset + 1) as usize;

        let mut received = 0;
        let mut retry_count = 0;

        while received < expected_size {
            let current_start = offset + received as u64;
            let range = format!("bytes={}-{}", current_start, end);

            let result = self
                .client
                .get(&self.url)
                .header("Range", &range)
                .send()
                .await;

            match result {
                Ok(resp) => {
                    if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    let bytes = resp.bytes().await?;
                    if bytes.is_empty() {
                        bail!("Server returned an empty range for {}", range);
                    }
                    let chunk_len = bytes.len().min(expected_size - received);
                    buf[received..received + chunk_len].copy_from_slice(&bytes[..chunk_len]);
                    received += chunk_len;

                    self.transferred_bytes
                        .fetch_add(chunk_len as u64, Ordering::Relaxed);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    self.backoff(retry_count, &e).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}
