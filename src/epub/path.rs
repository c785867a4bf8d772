//! Reference resolution inside the archive namespace.
//!
//! Archive paths are treated as URL paths on a synthetic authority: the base
//! directory is rooted at `/`, the reference is joined onto it, dot segments
//! are collapsed, and the leading slashes are dropped again. Nothing here
//! touches the filesystem.

/// Resolve `reference` against the archive directory `base_dir`.
///
/// Returns `None` when the reference cannot name an archive member: it is
/// empty (or only a fragment/query), carries a URL scheme, is a
/// network-path reference, or percent-decodes to invalid UTF-8.
pub fn resolve(base_dir: &str, reference: &str) -> Option<String> {
    let reference = reference.trim().replace('\\', "/");
    let reference = reference
        .split(['#', '?'])
        .next()
        .unwrap_or_default();

    if reference.is_empty() || has_scheme(reference) || reference.starts_with("//") {
        return None;
    }

    let joined = if reference.starts_with('/') {
        reference.to_string()
    } else {
        let base_dir = base_dir.replace('\\', "/");
        let mut base = String::with_capacity(base_dir.len() + reference.len() + 2);
        if !base_dir.starts_with('/') {
            base.push('/');
        }
        base.push_str(&base_dir);
        if !base.ends_with('/') {
            base.push('/');
        }
        base.push_str(reference);
        base
    };

    let mut segments: Vec<String> = Vec::new();
    let mut trailing_dir = false;
    for raw in joined.split('/').skip(1) {
        let segment = urlencoding::decode(raw).ok()?;
        trailing_dir = false;
        match segment.as_ref() {
            "." => trailing_dir = true,
            ".." => {
                // Clamped at the root, as URL resolution does
                segments.pop();
                trailing_dir = true;
            }
            _ => segments.push(segment.into_owned()),
        }
    }
    if trailing_dir {
        segments.push(String::new());
    }

    Some(segments.join("/").trim_start_matches('/').to_string())
}

/// Directory part of an archive path: everything before the last `/`.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Extension of the final path segment, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

/// `scheme ":"` per RFC 3986: a letter followed by letters, digits, `+`, `-`, `.`.
fn has_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("OEBPS/", "images/a.png").as_deref(),
            Some("OEBPS/images/a.png")
        );
        assert_eq!(
            resolve("OEBPS/text/", "../images/a.png").as_deref(),
            Some("OEBPS/images/a.png")
        );
        assert_eq!(
            resolve("OEBPS/text", "./a.png").as_deref(),
            Some("OEBPS/text/a.png")
        );
    }

    #[test]
    fn test_resolve_empty_base() {
        assert_eq!(resolve("", "img/cover.jpg").as_deref(), Some("img/cover.jpg"));
        assert_eq!(resolve("/", "cover.jpg").as_deref(), Some("cover.jpg"));
    }

    #[test]
    fn test_resolve_absolute_reference() {
        assert_eq!(
            resolve("OEBPS/text", "/images/a.png").as_deref(),
            Some("images/a.png")
        );
    }

    #[test]
    fn test_parent_segments_clamp_at_root() {
        assert_eq!(
            resolve("OEBPS", "../../../a.png").as_deref(),
            Some("a.png")
        );
    }

    #[test]
    fn test_strips_fragment_and_query() {
        assert_eq!(
            resolve("OEBPS", "img/a.svg#layer1").as_deref(),
            Some("OEBPS/img/a.svg")
        );
        assert_eq!(
            resolve("OEBPS", "img/a.png?v=2").as_deref(),
            Some("OEBPS/img/a.png")
        );
        assert_eq!(resolve("OEBPS", "#top"), None);
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            resolve("OEBPS", "my%20images/caf%C3%A9.jpg").as_deref(),
            Some("OEBPS/my images/café.jpg")
        );
        assert_eq!(resolve("OEBPS", "bad%FF.jpg"), None);
    }

    #[test]
    fn test_backslashes_are_separators() {
        assert_eq!(
            resolve("OEBPS\\text", "..\\img\\a.png").as_deref(),
            Some("OEBPS/img/a.png")
        );
    }

    #[test]
    fn test_rejects_external_references() {
        assert_eq!(resolve("OEBPS", ""), None);
        assert_eq!(resolve("OEBPS", "https://example.com/a.png"), None);
        assert_eq!(resolve("OEBPS", "data:image/png;base64,AAAA"), None);
        assert_eq!(resolve("OEBPS", "//cdn.example.com/a.png"), None);
    }

    #[test]
    fn test_trailing_dot_segment_keeps_directory() {
        assert_eq!(resolve("OEBPS/text", "..").as_deref(), Some("OEBPS/"));
    }

    #[test]
    fn test_parent_dir_and_extension() {
        assert_eq!(parent_dir("OEBPS/content.opf"), "OEBPS");
        assert_eq!(parent_dir("content.opf"), "");
        assert_eq!(extension("OEBPS/img/Cover.JPG"), Some("JPG"));
        assert_eq!(extension("OEBPS/v1.0/picture"), None);
        assert_eq!(extension("a.tar.gz"), Some("gz"));
    }
}
