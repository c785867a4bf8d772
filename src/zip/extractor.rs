use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract file data to memory, inflating DEFLATE entries and verifying
    /// the CRC-32 recorded in the Central Directory.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("Encrypted entry not supported: {}", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        if data_offset.saturating_add(entry.compressed_size) > self.parser.size() {
            bail!("Entry data lies outside the archive: {}", entry.file_name);
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .read_exact_at(data_offset, &mut raw)
            .await
            .with_context(|| format!("Failed to read {}", entry.file_name))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // One byte past the declared size is enough to detect a mismatch
                let mut out = Vec::with_capacity(entry.uncompressed_size.min(1 << 26) as usize);
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .with_context(|| format!("Failed to inflate {}", entry.file_name))?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method {} for {}",
                    method,
                    entry.file_name
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch for {}: expected {} bytes, got {}",
                entry.file_name,
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("CRC-32 mismatch for {}", entry.file_name);
        }

        Ok(data)
    }
}
