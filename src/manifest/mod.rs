//! Installable-app metadata rendering.
//!
//! Parses the project's web-app manifest and renders it as an escaped JSON
//! payload inside a `<metadata>` element. Every string value is escaped for
//! XML reserved characters unconditionally; unescaped metadata could
//! corrupt the structure of the whole composite document.

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use crate::collect::SourceArtifact;
use crate::error::{IssueCode, ValidationIssue};

/// Element id of the rendered metadata block. The validator's feature
/// check and the runtime shim both look it up by this id.
pub const METADATA_BLOCK_ID: &str = "svgpack-manifest";

/// Installable-app manifest fields carried into the composite document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub theme_color: String,
    pub background_color: String,
}

impl Default for AppManifest {
    fn default() -> Self {
        Self {
            name: "svgpack app".to_string(),
            short_name: "app".to_string(),
            description: String::new(),
            start_url: ".".to_string(),
            display: "standalone".to_string(),
            theme_color: "#ffffff".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }
}

/// Metadata block plus any fallback warnings.
#[derive(Debug)]
pub struct MetadataOutput {
    pub block: String,
    pub issues: Vec<ValidationIssue>,
}

/// Parse the manifest artifact (if any) and render the metadata block.
///
/// A missing or unparseable manifest degrades to defaults with a warning;
/// metadata problems never abort a build.
pub fn render_metadata(manifest_artifact: Option<&SourceArtifact>) -> MetadataOutput {
    let mut issues = Vec::new();

    let manifest = match manifest_artifact {
        Some(artifact) => match serde_json::from_slice::<AppManifest>(&artifact.content) {
            Ok(manifest) => manifest,
            Err(e) => {
                issues.push(ValidationIssue::warning(
                    IssueCode::ManifestFallback,
                    format!("manifest `{}` is not valid JSON ({e}), using defaults", artifact.rel),
                ));
                AppManifest::default()
            }
        },
        None => {
            issues.push(ValidationIssue::warning(
                IssueCode::ManifestFallback,
                "no manifest found, using defaults",
            ));
            AppManifest::default()
        }
    };

    MetadataOutput {
        block: render_block(&manifest),
        issues,
    }
}

/// Render the manifest as an escaped JSON payload in a `<metadata>`
/// element. The JSON itself is valid after XML-unescaping, so the runtime
/// can `JSON.parse` the element's text content.
fn render_block(manifest: &AppManifest) -> String {
    // serde_json never fails on this struct; the fallback keeps the
    // signature infallible without an unwrap.
    let json = serde_json::to_string(manifest).unwrap_or_else(|_| "{}".to_string());
    format!(
        r#"<metadata id="{METADATA_BLOCK_ID}" data-role="app-manifest">{}</metadata>"#,
        escape(&json)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{ArtifactKind, ContentHash};
    use std::path::PathBuf;

    fn manifest_artifact(json: &str) -> SourceArtifact {
        SourceArtifact {
            path: PathBuf::from("manifest.json"),
            rel: "manifest.json".to_string(),
            kind: ArtifactKind::Manifest,
            content: json.as_bytes().to_vec(),
            hash: ContentHash::of(json.as_bytes()),
        }
    }

    #[test]
    fn test_renders_named_manifest() {
        let artifact = manifest_artifact(r#"{"name":"T"}"#);
        let output = render_metadata(Some(&artifact));

        assert!(output.issues.is_empty());
        assert!(output.block.starts_with(&format!("<metadata id=\"{METADATA_BLOCK_ID}\"")));
        assert!(output.block.contains(r#"&quot;name&quot;:&quot;T&quot;"#));
        // Unspecified fields fall back to defaults
        assert!(output.block.contains("standalone"));
    }

    #[test]
    fn test_all_reserved_characters_escaped() {
        let artifact =
            manifest_artifact(r#"{"name":"a<b>&\"c'","description":"x & y"}"#);
        let output = render_metadata(Some(&artifact));

        let payload = output
            .block
            .strip_prefix(&format!(
                r#"<metadata id="{METADATA_BLOCK_ID}" data-role="app-manifest">"#
            ))
            .and_then(|rest| rest.strip_suffix("</metadata>"))
            .unwrap();

        // No raw reserved characters may survive in the payload
        assert!(!payload.contains('<'));
        assert!(!payload.contains('>'));
        assert!(!payload.contains('"'));
        assert!(!payload.contains('\''));
        for (i, c) in payload.char_indices() {
            if c == '&' {
                let rest = &payload[i..];
                assert!(
                    rest.starts_with("&amp;")
                        || rest.starts_with("&lt;")
                        || rest.starts_with("&gt;")
                        || rest.starts_with("&quot;")
                        || rest.starts_with("&apos;"),
                    "bare ampersand in payload"
                );
            }
        }
    }

    #[test]
    fn test_missing_manifest_uses_defaults_with_warning() {
        let output = render_metadata(None);
        assert_eq!(output.issues.len(), 1);
        assert_eq!(output.issues[0].code, IssueCode::ManifestFallback);
        assert!(output.block.contains("svgpack app"));
    }

    #[test]
    fn test_broken_manifest_degrades() {
        let artifact = manifest_artifact("{not json");
        let output = render_metadata(Some(&artifact));
        assert_eq!(output.issues.len(), 1);
        assert!(!output.issues[0].is_error());
        assert!(output.block.contains(METADATA_BLOCK_ID));
    }
}
