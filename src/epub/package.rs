//! Package document (OPF) parsing.
//!
//! Only two projections of the package matter here: the manifest, mapping
//! item ids to hrefs, and the spine, the reading order as a list of ids.

use std::collections::HashMap;

use anyhow::Result;

use super::Archive;
use super::xml;

/// Manifest and spine of a package document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Item id to href, relative to the package document's directory.
    pub manifest: HashMap<String, String>,
    /// Item ids in reading order. Repeats are kept.
    pub spine: Vec<String>,
}

impl Package {
    /// Parse package XML, or `None` if it is not well-formed.
    ///
    /// Every `item` carrying both `id` and `href` enters the manifest, later
    /// duplicates replacing earlier ones. Every `itemref` with an `idref`
    /// enters the spine in document order.
    pub fn parse(path: &str, text: &str) -> Option<Self> {
        let doc = xml::parse(path, text)?;

        let manifest = xml::elements(&doc, "item")
            .filter_map(|item| {
                let id = xml::non_empty(item.attribute("id"))?;
                let href = xml::non_empty(item.attribute("href"))?;
                Some((id.to_string(), href.to_string()))
            })
            .collect();

        let spine = xml::elements(&doc, "itemref")
            .filter_map(|itemref| itemref.attribute("idref"))
            .map(str::to_string)
            .collect();

        Some(Self { manifest, spine })
    }

    /// Href for a spine id, if the manifest declares it.
    pub fn href(&self, id: &str) -> Option<&str> {
        self.manifest.get(id).map(String::as_str)
    }
}

/// Load and parse the package document at `package_path`.
///
/// `Ok(None)` when the member is missing or unparseable.
pub async fn parse_package(archive: &Archive, package_path: &str) -> Result<Option<Package>> {
    let Some(entry) = archive.get(package_path) else {
        tracing::debug!(package_path, "package document missing");
        return Ok(None);
    };

    let text = archive.read_text(entry).await?;
    Ok(Package::parse(package_path, &text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test Book</dc:title>
  </metadata>
  <manifest>
    <item id="cover" href="img/cover.jpg" media-type="image/jpeg"/>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="no-href" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="cover"/>
    <itemref idref="ch1"/>
    <itemref linear="no"/>
    <itemref idref="ch2"/>
    <itemref idref="ch1"/>
  </spine>
</package>"#;

    #[test]
    fn test_parse_manifest_and_spine() {
        let package = Package::parse("content.opf", OPF).unwrap();

        assert_eq!(package.manifest.len(), 3);
        assert_eq!(package.href("ch1"), Some("text/ch1.xhtml"));
        assert_eq!(package.href("no-href"), None);
        assert_eq!(package.spine, ["cover", "ch1", "ch2", "ch1"]);
    }

    #[test]
    fn test_duplicate_ids_last_wins() {
        let opf = r#"<package><manifest>
            <item id="a" href="first.xhtml"/>
            <item id="a" href="second.xhtml"/>
        </manifest><spine><itemref idref="a"/></spine></package>"#;

        let package = Package::parse("content.opf", opf).unwrap();
        assert_eq!(package.href("a"), Some("second.xhtml"));
    }

    #[test]
    fn test_unparseable_package() {
        assert_eq!(Package::parse("content.opf", "<package><manifest>"), None);
    }

    #[test]
    fn test_empty_package() {
        let package = Package::parse("content.opf", "<package/>").unwrap();
        assert!(package.manifest.is_empty());
        assert!(package.spine.is_empty());
    }
}
