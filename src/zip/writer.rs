//! In-memory ZIP archive writer.
//!
//! Entries are appended as Local File Header + data; `finish` emits the
//! Central Directory and the End of Central Directory record. Every entry is
//! stamped with the DOS epoch so the same entries always serialize to the
//! same bytes. ZIP64 output is not supported: archives that would need it
//! are rejected.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Crc;
use flate2::write::DeflateEncoder;
use std::io::Write;

use anyhow::{Context, Result, bail};

use super::structures::*;

/// How entry data is stored in the output archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Store bytes as-is. Images are already compressed, so this is the default.
    #[default]
    Stored,
    /// DEFLATE each entry, falling back to STORED when it does not shrink.
    Deflate,
}

/// Metadata kept per entry until the Central Directory is written.
struct CentralRecord {
    name: String,
    method: CompressionMethod,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    lfh_offset: u32,
}

pub struct ZipWriter {
    buf: Vec<u8>,
    records: Vec<CentralRecord>,
    compression: Compression,
}

impl ZipWriter {
    pub fn new(compression: Compression) -> Self {
        Self {
            buf: Vec::new(),
            records: Vec::new(),
            compression,
        }
    }

    /// Append a file entry.
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if self.records.len() >= u16::MAX as usize {
            bail!("Too many entries for a non-ZIP64 archive");
        }
        let name_len = u16::try_from(name.len()).context("Entry name too long")?;
        let uncompressed_size =
            u32::try_from(data.len()).with_context(|| format!("Entry too large: {}", name))?;
        let lfh_offset = u32::try_from(self.buf.len()).context("Archive exceeds 4 GiB")?;

        let mut crc = Crc::new();
        crc.update(data);

        let deflated = match self.compression {
            Compression::Stored => None,
            Compression::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                Some(encoder.finish()?).filter(|d| d.len() < data.len())
            }
        };
        let (method, payload) = match &deflated {
            Some(d) => (CompressionMethod::Deflate, d.as_slice()),
            None => (CompressionMethod::Stored, data),
        };
        let compressed_size = payload.len() as u32;

        let out = &mut self.buf;
        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(method.version_needed())?;
        out.write_u16::<LittleEndian>(FLAG_UTF8)?;
        out.write_u16::<LittleEndian>(method.as_u16())?;
        out.write_u16::<LittleEndian>(DOS_EPOCH_TIME)?;
        out.write_u16::<LittleEndian>(DOS_EPOCH_DATE)?;
        out.write_u32::<LittleEndian>(crc.sum())?;
        out.write_u32::<LittleEndian>(compressed_size)?;
        out.write_u32::<LittleEndian>(uncompressed_size)?;
        out.write_u16::<LittleEndian>(name_len)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_all(name.as_bytes())?;
        out.write_all(payload)?;

        self.records.push(CentralRecord {
            name: name.to_string(),
            method,
            crc32: crc.sum(),
            compressed_size,
            uncompressed_size,
            lfh_offset,
        });

        Ok(())
    }

    /// Write the Central Directory and EOCD, returning the archive bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = u32::try_from(self.buf.len()).context("Archive exceeds 4 GiB")?;

        for record in &self.records {
            let out = &mut self.buf;
            out.write_all(CDFH_SIGNATURE)?;
            out.write_u16::<LittleEndian>(20)?; // made by: MS-DOS, APPNOTE 2.0
            out.write_u16::<LittleEndian>(record.method.version_needed())?;
            out.write_u16::<LittleEndian>(FLAG_UTF8)?;
            out.write_u16::<LittleEndian>(record.method.as_u16())?;
            out.write_u16::<LittleEndian>(DOS_EPOCH_TIME)?;
            out.write_u16::<LittleEndian>(DOS_EPOCH_DATE)?;
            out.write_u32::<LittleEndian>(record.crc32)?;
            out.write_u32::<LittleEndian>(record.compressed_size)?;
            out.write_u32::<LittleEndian>(record.uncompressed_size)?;
            out.write_u16::<LittleEndian>(record.name.len() as u16)?;
            out.write_u16::<LittleEndian>(0)?; // extra field length
            out.write_u16::<LittleEndian>(0)?; // comment length
            out.write_u16::<LittleEndian>(0)?; // disk number start
            out.write_u16::<LittleEndian>(0)?; // internal attributes
            out.write_u32::<LittleEndian>(0)?; // external attributes
            out.write_u32::<LittleEndian>(record.lfh_offset)?;
            out.write_all(record.name.as_bytes())?;
        }

        let cd_size = u32::try_from(self.buf.len() - cd_offset as usize)
            .context("Central Directory exceeds 4 GiB")?;
        let eocd =
            EndOfCentralDirectory::single_disk(self.records.len() as u16, cd_size, cd_offset);
        eocd.write_to(&mut self.buf)?;

        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::ZipExtractor;
    use std::io::Cursor;
    use std::sync::Arc;

    fn sample(compression: Compression) -> Vec<u8> {
        let mut writer = ZipWriter::new(compression);
        writer.add_file("00001.jpg", &[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        writer
            .add_file("00002.png", "text ".repeat(200).as_bytes())
            .unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_empty_archive_is_bare_eocd() {
        let bytes = ZipWriter::new(Compression::Stored).finish().unwrap();
        assert_eq!(bytes.len(), EndOfCentralDirectory::SIZE);

        let archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_output_is_deterministic() {
        assert_eq!(sample(Compression::Stored), sample(Compression::Stored));
        assert_eq!(sample(Compression::Deflate), sample(Compression::Deflate));
    }

    #[test]
    fn test_readable_by_zip_crate() {
        use std::io::Read;

        for compression in [Compression::Stored, Compression::Deflate] {
            let mut archive = ::zip::ZipArchive::new(Cursor::new(sample(compression))).unwrap();
            assert_eq!(archive.len(), 2);

            let mut first = archive.by_index(0).unwrap();
            assert_eq!(first.name(), "00001.jpg");
            let mut data = Vec::new();
            first.read_to_end(&mut data).unwrap();
            assert_eq!(data, [0xFF, 0xD8, 0xFF, 0xE0]);
            drop(first);

            let mut second = archive.by_index(1).unwrap();
            let mut text = String::new();
            second.read_to_string(&mut text).unwrap();
            assert_eq!(text, "text ".repeat(200));
        }
    }

    #[test]
    fn test_deflate_only_when_smaller() {
        let bytes = sample(Compression::Deflate);
        let mut archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let methods: Vec<_> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().compression())
            .collect();
        assert_eq!(
            methods,
            [::zip::CompressionMethod::Stored, ::zip::CompressionMethod::Deflated]
        );
    }

    #[tokio::test]
    async fn test_round_trip_through_extractor() {
        let reader = Arc::new(MemoryReader::new(sample(Compression::Deflate)));
        let extractor = ZipExtractor::new(reader);

        let entries = extractor.list_files().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["00001.jpg", "00002.png"]);

        let text = extractor.extract_to_memory(&entries[1]).await.unwrap();
        assert_eq!(text, "text ".repeat(200).as_bytes());
    }
}
