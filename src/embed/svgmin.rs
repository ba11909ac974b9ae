//! SVG asset size reduction using usvg.
//!
//! Parses and re-serializes the SVG without indentation. The usvg tree
//! keeps the document's size and viewBox, so viewable bounds survive the
//! round trip. Any parse failure returns `None` and the caller keeps the
//! original bytes.

/// Re-serialize an SVG asset compactly. Returns `None` when the input
/// cannot be parsed (caller degrades to the original content).
pub fn optimize_svg(content: &[u8]) -> Option<Vec<u8>> {
    let tree = usvg::Tree::from_data(content, &usvg::Options::default()).ok()?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };

    Some(tree.to_string(&write_options).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
    <rect x="1" y="1" width="8" height="8" fill="red"/>
</svg>"#;

    #[test]
    fn test_optimize_preserves_viewbox() {
        let out = optimize_svg(SAMPLE.as_bytes()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"viewBox="0 0 10 10""#));
    }

    #[test]
    fn test_optimize_is_deterministic() {
        assert_eq!(
            optimize_svg(SAMPLE.as_bytes()),
            optimize_svg(SAMPLE.as_bytes())
        );
    }

    #[test]
    fn test_broken_svg_returns_none() {
        assert!(optimize_svg(b"<svg").is_none());
        assert!(optimize_svg(b"not svg at all").is_none());
    }
}
