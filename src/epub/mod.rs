//! EPUB image extraction pipeline.
//!
//! ```text
//! bytes -> Archive -> container.xml -> package path -> (manifest, spine)
//!       -> image paths in reading order -> deduplicated, renumbered ZIP
//! ```
//!
//! Structural problems (no container manifest, no package document) fail
//! the whole run. Problems with a single item (a spine id without a manifest
//! entry, a missing chapter, an unresolvable `src`) only skip that item.

mod archive;
mod collector;
mod container;
mod package;
pub mod path;
mod scanner;
mod xml;

pub use archive::Archive;
pub use collector::{ImageArchive, OutputEntry, collect, output_name};
pub use container::{CONTAINER_PATH, find_package_path};
pub use package::{Package, parse_package};
pub use scanner::{DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS, scan};

use thiserror::Error;

use crate::zip::Compression;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Not an EPUB container: {0}")]
    NotAContainer(&'static str),

    #[error("Package document unreadable: {0}")]
    PackageUnreadable(String),

    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

/// Pipeline stages, in order. A run that cannot reach the next stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ArchiveLoaded,
    PackagePathFound,
    PackageParsed,
    ImagesScanned,
    ArchiveBuilt,
}

/// Options for building the output archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub compression: Compression,
}

/// Outcome of one conversion.
#[derive(Debug, Clone)]
pub enum Conversion {
    Success(ImageArchive),
    Failure,
}

impl Conversion {
    pub fn is_success(&self) -> bool {
        matches!(self, Conversion::Success(_))
    }

    pub fn into_archive(self) -> Option<ImageArchive> {
        match self {
            Conversion::Success(archive) => Some(archive),
            Conversion::Failure => None,
        }
    }
}

/// Convert EPUB bytes into an archive of its images, collapsing every error
/// into [`Conversion::Failure`].
pub async fn epub_to_images(data: Vec<u8>, options: &ExtractOptions) -> Conversion {
    match try_epub_to_images(data, options).await {
        Ok(archive) => Conversion::Success(archive),
        Err(e) => {
            tracing::warn!("conversion failed: {:#}", e);
            Conversion::Failure
        }
    }
}

/// Convert EPUB bytes into an archive of its images.
///
/// Each run is independent; nothing is shared between calls.
pub async fn try_epub_to_images(
    data: Vec<u8>,
    options: &ExtractOptions,
) -> Result<ImageArchive, ExtractError> {
    let archive = Archive::load(data).await?;
    tracing::debug!(stage = ?Stage::ArchiveLoaded, members = archive.len());

    let package_path = find_package_path(&archive)
        .await?
        .ok_or(ExtractError::NotAContainer("no package document path"))?;
    tracing::debug!(stage = ?Stage::PackagePathFound, package_path = %package_path);

    let package = parse_package(&archive, &package_path)
        .await?
        .ok_or_else(|| ExtractError::PackageUnreadable(package_path.clone()))?;
    tracing::debug!(
        stage = ?Stage::PackageParsed,
        manifest = package.manifest.len(),
        spine = package.spine.len()
    );

    let image_paths = scan(&archive, &package, path::parent_dir(&package_path)).await?;
    tracing::debug!(stage = ?Stage::ImagesScanned, candidates = image_paths.len());

    let images = collect(&archive, &image_paths, options.compression).await?;
    tracing::debug!(stage = ?Stage::ArchiveBuilt, images = images.entries.len());

    tracing::info!(
        images = images.entries.len(),
        bytes = images.bytes.len(),
        "extracted images"
    );
    Ok(images)
}
