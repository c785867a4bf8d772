use std::borrow::Cow;

use roxmltree::{Document, Node, ParsingOptions};

/// Namespace of the `xlink:href` attribute on SVG `<image>`.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Parse an XML member, logging and returning `None` when it is malformed.
///
/// DTDs are allowed since XHTML content documents routinely carry a doctype.
pub fn parse<'a>(path: &str, text: &'a str) -> Option<Document<'a>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    match Document::parse_with_options(text, options) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::debug!(path, error = %e, "unparseable XML member");
            None
        }
    }
}

/// Entities every XML parser knows without a DTD.
const XML_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

/// Rewrite HTML named entities (`&nbsp;`, `&copy;`, ...) as numeric
/// character references so an XML parser accepts them.
///
/// XHTML 1.x content documents may use the HTML entity set through their
/// external DTD, which is never loaded. Unknown names are left untouched.
pub fn numeric_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut changed = false;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp + 1..];
        match named_entity(rest) {
            Some((len, chars)) => {
                for c in chars.chars() {
                    out.push_str(&format!("&#x{:X};", c as u32));
                }
                rest = &rest[len..];
                changed = true;
            }
            None => out.push('&'),
        }
    }
    out.push_str(rest);

    if changed { Cow::Owned(out) } else { Cow::Borrowed(text) }
}

/// Decode the HTML entity whose name starts `tail` (just past the `&`).
///
/// Returns the length of `name;` and the decoded text.
fn named_entity(tail: &str) -> Option<(usize, String)> {
    let end = tail.find(';')?;
    let name = &tail[..end];
    if name.is_empty()
        || name.len() > 32
        || !name.bytes().all(|b| b.is_ascii_alphanumeric())
        || XML_ENTITIES.contains(&name)
    {
        return None;
    }

    let reference = format!("&{};", name);
    match html_escape::decode_html_entities(&reference) {
        Cow::Owned(decoded) if decoded != reference => Some((end + 1, decoded)),
        _ => None,
    }
}

/// Elements with the given local name, in document order, in any namespace.
pub fn elements<'a, 'input: 'a>(
    doc: &'a Document<'input>,
    local_name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == local_name)
}

/// Attribute value that is present and non-empty.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_entities() {
        assert_eq!(numeric_entities("<p>&nbsp;</p>"), "<p>&#xA0;</p>");
        assert_eq!(
            numeric_entities("&copy; 2010 &mdash; A&amp;B"),
            "&#xA9; 2010 &#x2014; A&amp;B"
        );
    }

    #[test]
    fn test_numeric_entities_leaves_the_rest_alone() {
        let text = "a &lt; b &#160; &unknownthing; & c &nbsp";
        assert!(matches!(numeric_entities(text), Cow::Borrowed(t) if t == text));
        assert!(matches!(numeric_entities("no entities"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_parse_accepts_html_entities_after_rewrite() {
        let text = "<html><p>&nbsp;&eacute;</p></html>";
        assert!(parse("ch.xhtml", text).is_none());

        let rewritten = numeric_entities(text);
        let doc = parse("ch.xhtml", &rewritten).unwrap();
        let p = elements(&doc, "p").next().unwrap();
        assert_eq!(p.text(), Some("\u{a0}\u{e9}"));
    }
}
