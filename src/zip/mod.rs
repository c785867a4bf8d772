//! ZIP archive reading and writing.
//!
//! ## Architecture
//!
//! - [`structures`]: records of the ZIP format (EOCD, headers, entries)
//! - [`parser`]: Central Directory parsing over any [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: entry extraction with DEFLATE and CRC-32 verification
//! - [`writer`]: deterministic in-memory archive writer
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions when reading
//! - STORED and DEFLATE methods
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No ZIP64 output

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{Compression, ZipWriter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use std::io::{Cursor, Write};
    use std::sync::Arc;
    use ::zip::write::SimpleFileOptions;

    fn foreign_archive() -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(::zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(::zip::CompressionMethod::Deflated);

        writer.start_file("mimetype", stored).unwrap();
        writer.write_all(b"application/epub+zip").unwrap();
        writer.add_directory("OEBPS/", stored).unwrap();
        writer.start_file("OEBPS/chapter.xhtml", deflated).unwrap();
        writer.write_all("<p>chapter</p>".repeat(50).as_bytes()).unwrap();
        writer.set_comment("archive comment");
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_lists_foreign_archive_with_comment() {
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(foreign_archive())));
        let entries = extractor.list_files().await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["mimetype", "OEBPS/", "OEBPS/chapter.xhtml"]);
        assert!(entries[1].is_directory);
        assert_eq!(entries[2].compression_method, CompressionMethod::Deflate);
    }

    #[tokio::test]
    async fn test_extracts_stored_and_deflated() {
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(foreign_archive())));
        let entries = extractor.list_files().await.unwrap();

        let mimetype = extractor.extract_to_memory(&entries[0]).await.unwrap();
        assert_eq!(mimetype, b"application/epub+zip");

        let chapter = extractor.extract_to_memory(&entries[2]).await.unwrap();
        assert_eq!(chapter, "<p>chapter</p>".repeat(50).as_bytes());
    }

    #[tokio::test]
    async fn test_detects_crc_mismatch() {
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(foreign_archive())));
        let mut entries = extractor.list_files().await.unwrap();
        entries[0].crc32 ^= 1;

        let err = extractor.extract_to_memory(&entries[0]).await.unwrap_err();
        assert!(err.to_string().contains("CRC-32 mismatch"));
    }

    #[tokio::test]
    async fn test_rejects_non_zip() {
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(b"not a zip".to_vec())));
        assert!(extractor.list_files().await.is_err());
    }
}
