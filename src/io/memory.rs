use super::ReadAt;
use anyhow::Result;
use async_trait::async_trait;

/// Random access over an archive held entirely in memory
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl From<Vec<u8>> for MemoryReader {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        // Reads past the end are short, like pread
        let start = (offset as usize).min(self.data.len());
        let end = start.saturating_add(buf.len()).min(self.data.len());
        let n = end - start;
        buf[..n].copy_from_slice(&self.data[start..end]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_at_clamps_to_end() {
        let reader = MemoryReader::new(b"abcdef".to_vec());

        let mut buf = [0u8; 4];
        assert_eq!(reader.read_at(4, &mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");

        assert_eq!(reader.read_at(10, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_all() {
        let reader = MemoryReader::from(b"epub".to_vec());
        assert_eq!(reader.read_all().await.unwrap(), b"epub");
    }
}
