use anyhow::Result;

use super::Archive;
use super::xml;

/// Fixed location of the container manifest.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Locate the package document through `META-INF/container.xml`.
///
/// `Ok(None)` means the archive is not a usable container: the manifest is
/// missing or malformed, or its first `rootfile` has no `full-path`. There
/// is deliberately no fallback search for `*.opf` members.
pub async fn find_package_path(archive: &Archive) -> Result<Option<String>> {
    let Some(entry) = archive.get(CONTAINER_PATH) else {
        tracing::debug!("missing {}", CONTAINER_PATH);
        return Ok(None);
    };

    let text = archive.read_text(entry).await?;
    Ok(package_path_from(&text))
}

fn package_path_from(text: &str) -> Option<String> {
    let doc = xml::parse(CONTAINER_PATH, text)?;
    let rootfile = xml::elements(&doc, "rootfile").next()?;
    xml::non_empty(rootfile.attribute("full-path")).map(str::to_string)
}
