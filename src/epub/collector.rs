use std::collections::HashSet;

use anyhow::Result;

use super::Archive;
use crate::zip::{Compression, ZipWriter};

/// Width of the zero-padded sequence number in output names.
const INDEX_WIDTH: usize = 5;

/// One image written to the output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    /// Name inside the output archive, e.g. `00001.jpg`.
    pub name: String,
    /// Member path in the source EPUB.
    pub source: String,
}

/// The repackaged images: archive bytes plus the naming plan that produced them.
#[derive(Debug, Clone)]
pub struct ImageArchive {
    pub bytes: Vec<u8>,
    pub entries: Vec<OutputEntry>,
}

/// Output name for the `index`-th accepted image from `path`.
///
/// The extension is copied verbatim from the final path segment.
pub fn output_name(index: usize, path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let ext = file_name.rfind('.').map(|i| &file_name[i..]).unwrap_or("");
    format!("{:0width$}{}", index, ext, width = INDEX_WIDTH)
}

/// Deduplicate `image_paths`, number the survivors and pack them.
///
/// The first occurrence of a path fixes its position. Paths missing from
/// the archive are dropped without consuming a sequence number.
pub async fn collect(
    archive: &Archive,
    image_paths: &[String],
    compression: Compression,
) -> Result<ImageArchive> {
    let mut used = HashSet::new();
    let mut writer = ZipWriter::new(compression);
    let mut entries = Vec::new();

    for path in image_paths {
        if !used.insert(path.as_str()) {
            continue;
        }
        let Some(entry) = archive.get(path) else {
            tracing::debug!(path = %path, "image missing from archive");
            continue;
        };

        let bytes = archive.read_bytes(entry).await?;
        let name = output_name(entries.len() + 1, path);
        writer.add_file(&name, &bytes)?;
        tracing::trace!(name = %name, source = %path, "packed image");

        entries.push(OutputEntry {
            name,
            source: path.clone(),
        });
    }

    Ok(ImageArchive {
        bytes: writer.finish()?,
        entries,
    })
}
