//! # epub2image
//!
//! Extract the images of an EPUB in reading order into a new ZIP archive.
//!
//! The package document is located through `META-INF/container.xml`, its
//! spine is walked in order, and each spine item contributes at most one
//! image: the item itself when it is a raster image, or the first `<img>` /
//! SVG `<image>` of a content document. Repeated images are kept once, at
//! their first position, and renamed `00001.jpg`, `00002.png`, and so on.
//!
//! ## Features
//!
//! - Self-contained ZIP reader (ZIP64, STORED, DEFLATE, CRC-32 checks)
//! - Deterministic ZIP writer: the same EPUB always yields the same bytes
//! - Best-effort extraction: broken chapters are skipped, not fatal
//! - Local files or HTTP(S) URLs as input in the CLI
//!
//! ## Example
//!
//! ```no_run
//! use epub2image::{Conversion, ExtractOptions, epub_to_images};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let data = tokio::fs::read("novel.epub").await?;
//!
//!     match epub_to_images(data, &ExtractOptions::default()).await {
//!         Conversion::Success(images) => {
//!             for entry in &images.entries {
//!                 println!("{} <- {}", entry.name, entry.source);
//!             }
//!             tokio::fs::write("novel.epub_images.zip", &images.bytes).await?;
//!         }
//!         Conversion::Failure => eprintln!("Failed"),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod epub;
pub mod io;
pub mod job;
pub mod zip;

pub use cli::Cli;
pub use epub::{
    Conversion, ExtractError, ExtractOptions, ImageArchive, OutputEntry, epub_to_images,
    try_epub_to_images,
};
pub use io::{HttpSource, MemoryReader, ReadAt};
pub use job::{Job, Status};
pub use zip::{Compression, ZipExtractor, ZipFileEntry, ZipWriter};
