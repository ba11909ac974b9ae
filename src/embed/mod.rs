//! Asset embedding: binary assets become inline data URIs.
//!
//! MIME types come from an extension table (unknown extension ⇒ generic
//! binary type plus a warning). SVG assets optionally pass through a usvg
//! size-reducing transform. Assets whose inclusion crosses the configured
//! size ceiling are reported, never silently dropped.

mod mime;
mod svgmin;

pub use mime::{GENERIC_BINARY, mime_for_ext};

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use dashmap::DashMap;

use crate::collect::{ContentHash, SourceArtifact};
use crate::error::{IssueCode, ValidationIssue};

/// One embedded asset. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    /// Logical name: the artifact's source-relative path.
    pub name: String,
    pub mime: &'static str,
    pub data_uri: String,
    /// Encoded payload size (what the entry costs inside the document).
    pub byte_size: usize,
    /// True when an optimizing transform failed and the original bytes
    /// were embedded. Kept on the entry so cache hits re-report it.
    pub degraded: bool,
}

/// Cross-build cache of embedded assets, keyed by a combination of
/// content hash, name, and the optimize flag. Append-only.
pub type AssetCache = DashMap<ContentHash, Arc<AssetEntry>>;

/// Result of embedding all assets of one build.
#[derive(Debug, Default)]
pub struct EmbedOutput {
    pub entries: Vec<Arc<AssetEntry>>,
    pub total_bytes: usize,
    pub issues: Vec<ValidationIssue>,
}

impl EmbedOutput {
    /// Render the name → data URI mapping consumed by the logic bundle's
    /// `svgpack.asset()` accessor. Entries keep their scan order, so the
    /// JSON is deterministic.
    pub fn to_json(&self) -> String {
        let mut map = serde_json::Map::new();
        for entry in &self.entries {
            map.insert(
                entry.name.clone(),
                serde_json::Value::String(entry.data_uri.clone()),
            );
        }
        serde_json::Value::Object(map).to_string()
    }
}

/// Embed all asset artifacts as data URIs.
pub fn embed_assets(
    assets: &[&SourceArtifact],
    optimize: bool,
    size_ceiling: u64,
    strict: bool,
    cache: &AssetCache,
) -> EmbedOutput {
    let mut output = EmbedOutput::default();

    for artifact in assets {
        let (mime, known) = infer_mime(&artifact.rel);
        if !known {
            output.issues.push(ValidationIssue::warning(
                IssueCode::UnknownMime,
                format!("unknown extension for `{}`, embedding as {GENERIC_BINARY}", artifact.rel),
            ));
        }

        let key = ContentHash::combine(
            &format!("asset:{}:optimize={optimize}", artifact.rel),
            &[artifact.hash],
        );

        let entry = if let Some(hit) = cache.get(&key) {
            crate::debug!("embed"; "cache hit for {} ({key})", artifact.rel);
            Arc::clone(&hit)
        } else {
            let entry = Arc::new(encode_entry(artifact, mime, optimize));
            cache.insert(key, Arc::clone(&entry));
            entry
        };

        if entry.degraded {
            output.issues.push(ValidationIssue::warning(
                IssueCode::TransformError,
                format!("SVG optimization failed for `{}`, embedding original", entry.name),
            ));
        }

        output.total_bytes += entry.byte_size;
        if output.total_bytes as u64 > size_ceiling {
            output.issues.push(ValidationIssue::size_limit(
                format!(
                    "embedding `{}` brings total asset payload to {} bytes, over the {size_ceiling} byte ceiling",
                    entry.name, output.total_bytes
                ),
                strict,
            ));
        }

        output.entries.push(entry);
    }

    output
}

fn encode_entry(artifact: &SourceArtifact, mime: &'static str, optimize: bool) -> AssetEntry {
    let content: &[u8] = &artifact.content;

    let mut degraded = false;
    let optimized;
    let payload = if optimize && mime == "image/svg+xml" {
        match svgmin::optimize_svg(content) {
            Some(smaller) if smaller.len() < content.len() => {
                optimized = smaller;
                &optimized[..]
            }
            Some(_) => content,
            None => {
                degraded = true;
                content
            }
        }
    } else {
        content
    };

    let data_uri = format!("data:{mime};base64,{}", STANDARD.encode(payload));
    let byte_size = data_uri.len();

    AssetEntry {
        name: artifact.rel.clone(),
        mime,
        data_uri,
        byte_size,
        degraded,
    }
}

fn infer_mime(name: &str) -> (&'static str, bool) {
    let ext = name.rsplit('.').next().filter(|e| *e != name).unwrap_or("");
    match mime_for_ext(ext) {
        Some(mime) => (mime, true),
        None => (GENERIC_BINARY, false),
    }
}
