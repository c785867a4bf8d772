use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::io::MemoryReader;
use crate::zip::{ZipExtractor, ZipFileEntry};

/// A read-only EPUB archive held in memory, indexed by member path.
pub struct Archive {
    extractor: ZipExtractor<MemoryReader>,
    entries: HashMap<String, ZipFileEntry>,
}

impl Archive {
    /// Index the archive's Central Directory.
    ///
    /// Directory entries are left out of the index. When a name occurs more
    /// than once the later record wins.
    pub async fn load(data: Vec<u8>) -> Result<Self> {
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(data)));
        let entries = extractor
            .list_files()
            .await?
            .into_iter()
            .filter(|e| !e.is_directory)
            .map(|e| (e.file_name.clone(), e))
            .collect();

        Ok(Self { extractor, entries })
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, path: &str) -> Option<&ZipFileEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a member as UTF-8 text. Invalid sequences are replaced and a
    /// leading byte order mark is dropped.
    pub async fn read_text(&self, entry: &ZipFileEntry) -> Result<String> {
        let bytes = self.read_bytes(entry).await?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.strip_prefix('\u{FEFF}').unwrap_or(&text).to_string())
    }

    pub async fn read_bytes(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        self.extractor.extract_to_memory(entry).await
    }
}
