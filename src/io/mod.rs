mod http;
mod memory;

pub use http::HttpSource;
pub use memory::MemoryReader;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Read the whole source into memory.
    async fn read_all(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.size() as usize];
        let n = self.read_at(0, &mut buf).await?;
        if n != buf.len() {
            bail!("Short read: got {} of {} bytes", n, buf.len());
        }
        Ok(buf)
    }
}
