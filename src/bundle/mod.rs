//! Code and style bundling.
//!
//! Concatenates artifacts in a deterministic order (declared list first,
//! then lexical path order) and prepends the capability shim to the logic
//! bundle. Bundling is referentially transparent: identical inputs in
//! identical order yield byte-identical output, which makes the
//! content-hash cache sound.

mod minify;
mod shim;

pub use shim::{CAPABILITY_SHIM, OFFLINE_MARKER};

use std::sync::Arc;

use dashmap::DashMap;

use crate::collect::{ContentHash, SourceArtifact};
use crate::error::{IssueCode, ValidationIssue};

/// Cached bundle output, keyed by combined input hash. Append-only across
/// builds; entries are immutable once inserted.
pub type BundleCache = DashMap<ContentHash, Arc<BundleOutput>>;

/// Pure function of the hashed inputs (text plus whether minification
/// had to be skipped).
#[derive(Debug)]
pub struct BundleOutput {
    pub text: String,
    degraded: bool,
}

/// One bundle plus the issues produced while building it.
#[derive(Debug)]
pub struct Bundle {
    pub text: String,
    pub issues: Vec<ValidationIssue>,
}

/// Bundle logic artifacts: shim + ordered concatenation, optionally
/// minified. Minification failure degrades to the unminified text.
pub fn bundle_code(
    artifacts: &[&SourceArtifact],
    order: &[String],
    minify: bool,
    cache: &BundleCache,
) -> Bundle {
    build_bundle("code", artifacts, order, minify, cache, minify::minify_js, true)
}

/// Bundle style artifacts: ordered concatenation, optionally minified.
pub fn bundle_style(
    artifacts: &[&SourceArtifact],
    order: &[String],
    minify: bool,
    cache: &BundleCache,
) -> Bundle {
    build_bundle("style", artifacts, order, minify, cache, minify::minify_css, false)
}

#[allow(clippy::too_many_arguments)]
fn build_bundle(
    label: &str,
    artifacts: &[&SourceArtifact],
    order: &[String],
    minify: bool,
    cache: &BundleCache,
    minifier: fn(&str) -> Option<String>,
    with_shim: bool,
) -> Bundle {
    let ordered = order_artifacts(artifacts, order);

    let input_hashes: Vec<ContentHash> = ordered.iter().map(|a| a.hash).collect();
    let key = ContentHash::combine(&format!("{label}:minify={minify}"), &input_hashes);

    let output = if let Some(hit) = cache.get(&key) {
        crate::debug!("bundle"; "{label} cache hit ({key})");
        Arc::clone(&hit)
    } else {
        let output = Arc::new(concat_and_minify(&ordered, minify, minifier, with_shim));
        cache.insert(key, Arc::clone(&output));
        output
    };

    let mut issues = Vec::new();
    if output.degraded {
        issues.push(ValidationIssue::warning(
            IssueCode::TransformError,
            format!("{label} bundle minification failed, using unminified output"),
        ));
    }

    Bundle {
        text: output.text.clone(),
        issues,
    }
}

fn concat_and_minify(
    ordered: &[&SourceArtifact],
    minify: bool,
    minifier: fn(&str) -> Option<String>,
    with_shim: bool,
) -> BundleOutput {
    let concatenated = ordered
        .iter()
        .map(|a| String::from_utf8_lossy(&a.content).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    let (mut body, degraded) = if minify && !concatenated.is_empty() {
        match minifier(&concatenated) {
            Some(minified) => (minified, false),
            None => (concatenated, true),
        }
    } else {
        (concatenated, false)
    };

    if with_shim {
        // Shim stays unminified so its capability markers are stable.
        body = format!("{CAPABILITY_SHIM}\n{body}");
    }

    BundleOutput {
        text: body,
        degraded,
    }
}

/// Order artifacts by declared position, then lexical relative path.
fn order_artifacts<'a>(
    artifacts: &[&'a SourceArtifact],
    order: &[String],
) -> Vec<&'a SourceArtifact> {
    let mut ordered: Vec<&SourceArtifact> = artifacts.to_vec();
    ordered.sort_by(|a, b| {
        let pos = |artifact: &SourceArtifact| {
            order
                .iter()
                .position(|entry| entry == &artifact.rel)
                .unwrap_or(usize::MAX)
        };
        pos(a).cmp(&pos(b)).then_with(|| a.rel.cmp(&b.rel))
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::ArtifactKind;
    use std::path::PathBuf;

    fn artifact(rel: &str, content: &str) -> SourceArtifact {
        SourceArtifact {
            path: PathBuf::from(rel),
            rel: rel.to_string(),
            kind: ArtifactKind::from_path(&PathBuf::from(rel)),
            content: content.as_bytes().to_vec(),
            hash: ContentHash::of(content.as_bytes()),
        }
    }

    #[test]
    fn test_code_bundle_prepends_shim() {
        let a = artifact("app.js", "console.log(1)");
        let cache = BundleCache::default();
        let bundle = bundle_code(&[&a], &[], false, &cache);

        assert!(bundle.text.starts_with("var svgpack"));
        assert!(bundle.text.contains(OFFLINE_MARKER));
        assert!(bundle.text.ends_with("console.log(1)"));
        assert!(bundle.issues.is_empty());
    }

    #[test]
    fn test_lexical_order_by_default() {
        let b = artifact("b.js", "b()");
        let a = artifact("a.js", "a()");
        let cache = BundleCache::default();
        let bundle = bundle_code(&[&b, &a], &[], false, &cache);

        let a_pos = bundle.text.find("a()").unwrap();
        let b_pos = bundle.text.find("b()").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn test_declared_order_wins() {
        let a = artifact("a.js", "a()");
        let b = artifact("b.js", "b()");
        let order = vec!["b.js".to_string()];
        let cache = BundleCache::default();
        let bundle = bundle_code(&[&a, &b], &order, false, &cache);

        let a_pos = bundle.text.find("a()").unwrap();
        let b_pos = bundle.text.find("b()").unwrap();
        assert!(b_pos < a_pos, "declared files come before unlisted ones");
    }

    #[test]
    fn test_byte_identical_across_runs() {
        let a = artifact("a.js", "let x = 1;");
        let b = artifact("b.js", "let y = 2;");

        let first = bundle_code(&[&a, &b], &[], true, &BundleCache::default());
        let again = bundle_code(&[&a, &b], &[], true, &BundleCache::default());
        assert_eq!(first.text, again.text);
    }

    #[test]
    fn test_cache_hit_returns_same_text() {
        let a = artifact("a.js", "let x = 1;");
        let cache = BundleCache::default();

        let first = bundle_code(&[&a], &[], false, &cache);
        assert_eq!(cache.len(), 1);
        let again = bundle_code(&[&a], &[], false, &cache);
        assert_eq!(cache.len(), 1);
        assert_eq!(first.text, again.text);
    }

    #[test]
    fn test_minify_failure_degrades_with_warning() {
        let broken = artifact("app.js", "function (");
        let cache = BundleCache::default();
        let bundle = bundle_code(&[&broken], &[], true, &cache);

        assert!(bundle.text.contains("function ("));
        assert_eq!(bundle.issues.len(), 1);
        assert_eq!(bundle.issues[0].code, IssueCode::TransformError);
        assert!(!bundle.issues[0].is_error());
    }

    #[test]
    fn test_degrade_warning_survives_cache_hit() {
        let broken = artifact("app.js", "function (");
        let cache = BundleCache::default();

        bundle_code(&[&broken], &[], true, &cache);
        let again = bundle_code(&[&broken], &[], true, &cache);
        assert_eq!(again.issues.len(), 1);
    }

    #[test]
    fn test_style_bundle_has_no_shim() {
        let css = artifact("main.css", "body{color:red}");
        let cache = BundleCache::default();
        let bundle = bundle_style(&[&css], &[], false, &cache);
        assert_eq!(bundle.text, "body{color:red}");
    }

    #[test]
    fn test_minified_and_plain_use_distinct_cache_keys() {
        let a = artifact("a.js", "let value = 1;");
        let cache = BundleCache::default();
        bundle_code(&[&a], &[], false, &cache);
        bundle_code(&[&a], &[], true, &cache);
        assert_eq!(cache.len(), 2);
    }
}
