//! Spine walk producing candidate image paths in reading order.

use anyhow::Result;

use super::package::Package;
use super::path::{extension, parent_dir, resolve};
use super::{Archive, xml};

/// Raster image suffixes emitted directly when a spine item points at one.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "avif"];

/// Markup suffixes searched for an embedded image.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["xhtml", "html"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Image,
    Document,
    Other,
}

impl ItemKind {
    fn of(path: &str) -> Self {
        let Some(ext) = extension(path) else {
            return ItemKind::Other;
        };
        let known = |list: &[&str]| list.iter().any(|e| ext.eq_ignore_ascii_case(e));
        if known(IMAGE_EXTENSIONS) {
            ItemKind::Image
        } else if known(DOCUMENT_EXTENSIONS) {
            ItemKind::Document
        } else {
            ItemKind::Other
        }
    }
}

/// Walk the spine and collect one image path per item, at most.
///
/// Image items contribute their own path. Content documents contribute the
/// first `<img>` (or, failing that, SVG `<image>`) they contain, resolved
/// against the document's own directory. Anything unresolvable or missing
/// is skipped. The result may repeat paths.
pub async fn scan(archive: &Archive, package: &Package, package_dir: &str) -> Result<Vec<String>> {
    let mut images = Vec::new();

    for id in &package.spine {
        let Some(href) = package.href(id) else {
            tracing::debug!(id = %id, "spine id not in manifest");
            continue;
        };
        let Some(item_path) = resolve(package_dir, href) else {
            tracing::debug!(href, "unresolvable manifest href");
            continue;
        };

        match ItemKind::of(&item_path) {
            ItemKind::Image => images.push(item_path),
            ItemKind::Document => {
                if let Some(image) = first_image_in(archive, &item_path).await? {
                    images.push(image);
                }
            }
            ItemKind::Other => {}
        }
    }

    Ok(images)
}

async fn first_image_in(archive: &Archive, doc_path: &str) -> Result<Option<String>> {
    let Some(entry) = archive.get(doc_path) else {
        tracing::debug!(doc_path, "content document missing");
        return Ok(None);
    };
    let text = archive.read_text(entry).await?;

    let Some(reference) = first_image_reference(doc_path, &text) else {
        return Ok(None);
    };
    let resolved = resolve(parent_dir(doc_path), &reference);
    if resolved.is_none() {
        tracing::debug!(doc_path, reference = %reference, "unresolvable image reference");
    }
    Ok(resolved)
}

/// Raw reference of the document's first `<img>`, else first `<image>`.
///
/// `xlink:href` takes precedence over `src`.
fn first_image_reference(doc_path: &str, text: &str) -> Option<String> {
    let text = xml::numeric_entities(text);
    let doc = xml::parse(doc_path, &text)?;
    let element = xml::elements(&doc, "img")
        .next()
        .or_else(|| xml::elements(&doc, "image").next())?;

    xml::non_empty(element.attribute((xml::XLINK_NS, "href")))
        .or_else(|| xml::non_empty(element.attribute("src")))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_is_case_insensitive() {
        assert_eq!(ItemKind::of("OEBPS/img/COVER.JPG"), ItemKind::Image);
        assert_eq!(ItemKind::of("OEBPS/img/pic.avif"), ItemKind::Image);
        assert_eq!(ItemKind::of("OEBPS/text/ch1.XHTML"), ItemKind::Document);
        assert_eq!(ItemKind::of("OEBPS/text/ch1.html"), ItemKind::Document);
        assert_eq!(ItemKind::of("OEBPS/style.css"), ItemKind::Other);
        assert_eq!(ItemKind::of("OEBPS/img/pic.svg"), ItemKind::Other);
        assert_eq!(ItemKind::of("OEBPS/README"), ItemKind::Other);
    }

    #[test]
    fn test_first_img_wins() {
        let xhtml = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<body>
  <p><img src="../img/fig1.png" alt=""/></p>
  <p><img src="../img/fig2.png" alt=""/></p>
</body>
</html>"#;
        assert_eq!(
            first_image_reference("text/ch1.xhtml", xhtml).as_deref(),
            Some("../img/fig1.png")
        );
    }

    #[test]
    fn test_xhtml11_named_entities() {
        let xhtml = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter&nbsp;1 &mdash; Caf&eacute;</title></head>
<body>
  <p>&nbsp;</p><img src="../img/fig1.png" alt="Fig&nbsp;1"/>
</body>
</html>"#;
        assert_eq!(
            first_image_reference("OEBPS/text/ch1.xhtml", xhtml).as_deref(),
            Some("../img/fig1.png")
        );
    }

    #[test]
    fn test_img_preferred_over_svg_image() {
        let xhtml = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:xlink="http://www.w3.org/1999/xlink">
<body>
  <svg xmlns="http://www.w3.org/2000/svg"><image xlink:href="cover.jpg"/></svg>
  <img src="later.png"/>
</body>
</html>"#;
        assert_eq!(
            first_image_reference("ch.xhtml", xhtml).as_deref(),
            Some("later.png")
        );
    }

    #[test]
    fn test_svg_image_xlink_href() {
        let xhtml = r#"<html xmlns="http://www.w3.org/1999/xhtml">
<body>
  <svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
    <image width="600" height="800" xlink:href="../images/cover.jpeg"/>
  </svg>
</body>
</html>"#;
        assert_eq!(
            first_image_reference("ch.xhtml", xhtml).as_deref(),
            Some("../images/cover.jpeg")
        );
    }

    #[test]
    fn test_empty_xlink_falls_back_to_src() {
        let xhtml = r#"<html xmlns:xlink="http://www.w3.org/1999/xlink">
<img xlink:href="" src="a.gif"/>
</html>"#;
        assert_eq!(first_image_reference("ch.xhtml", xhtml).as_deref(), Some("a.gif"));
    }

    #[test]
    fn test_no_image_or_no_reference() {
        assert_eq!(
            first_image_reference("ch.xhtml", "<html><body><p>text</p></body></html>"),
            None
        );
        assert_eq!(
            first_image_reference("ch.xhtml", r#"<html><img alt="x"/></html>"#),
            None
        );
        assert_eq!(first_image_reference("ch.xhtml", "<html><p>&nbsp;</p></html>"), None);
    }
}
