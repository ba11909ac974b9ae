//! One full packaging pass.
//!
//! Collector output fans out to the bundler, embedder, and metadata
//! generator (disjoint immutable inputs, run via rayon); all three complete
//! before composition. The composed document is validated and written,
//! producing a [`BuildResult`].

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use quick_xml::escape::escape;

use crate::bundle::{self, BundleCache};
use crate::collect::{self, ArtifactKind};
use crate::compose::CompositeDocument;
use crate::config::PackConfig;
use crate::embed::{self, AssetCache};
use crate::error::{BuildError, ValidationIssue};
use crate::manifest;
use crate::validate;

/// Element id of the embedded asset table (name → data URI), consumed by
/// the capability shim's `svgpack.asset()` accessor.
pub const ASSET_BLOCK_ID: &str = "svgpack-assets";

/// Content-hash-keyed caches shared across builds. The only cross-build
/// mutable state; append-only, so a build never observes a partially
/// written entry.
#[derive(Debug, Default)]
pub struct BuildCaches {
    pub bundles: BundleCache,
    pub assets: AssetCache,
}

/// Outcome of one build. Persisted by the caller until superseded.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub document: String,
    /// Ordered issue list: scan, bundle, embed, metadata, then validation.
    pub issues: Vec<ValidationIssue>,
    pub byte_size: usize,
    pub duration: Duration,
    /// True when no error-severity issue was reported.
    pub success: bool,
}

/// Run one packaging pass.
///
/// Composition failures (and template/output IO failures) abort the
/// attempt with `Err`; every other defect lands in the issue list of an
/// `Ok` result.
pub fn build(config: &PackConfig, caches: &BuildCaches) -> Result<BuildResult, BuildError> {
    let started = Instant::now();

    let template_path = config.template_path();
    let skeleton = fs::read_to_string(&template_path)
        .map_err(|e| BuildError::Template(template_path, e))?;

    let scan = collect::scan_sources(config);
    crate::debug!("build"; "collected {} artifact(s)", scan.artifacts.len());

    let code = scan.of_kind(ArtifactKind::Code);
    let style = scan.of_kind(ArtifactKind::Style);
    let assets = scan.of_kind(ArtifactKind::Asset);
    let manifest_artifact = scan.of_kind(ArtifactKind::Manifest).into_iter().next();

    // Fan-out over disjoint immutable inputs; joins are the barrier before
    // composition.
    let build_cfg = &config.build;
    let (code_bundle, (style_bundle, (embedded, metadata))) = rayon::join(
        || bundle::bundle_code(&code, &build_cfg.order, build_cfg.minify, &caches.bundles),
        || {
            rayon::join(
                || {
                    bundle::bundle_style(&style, &build_cfg.order, build_cfg.minify, &caches.bundles)
                },
                || {
                    rayon::join(
                        || {
                            embed::embed_assets(
                                &assets,
                                build_cfg.optimize,
                                build_cfg.size_ceiling,
                                build_cfg.strict,
                                &caches.assets,
                            )
                        },
                        || manifest::render_metadata(manifest_artifact),
                    )
                },
            )
        },
    );

    let asset_block;
    let mut composite = CompositeDocument::new(&skeleton);
    composite
        .set("JS", &code_bundle.text)
        .set("CSS", &style_bundle.text)
        .set("METADATA", &metadata.block);
    if !embedded.entries.is_empty() {
        asset_block = render_asset_block(&embedded);
        composite.set("ASSETS", &asset_block);
    }

    let document = composite.compose()?;

    let mut issues = scan.issues;
    issues.extend(code_bundle.issues);
    issues.extend(style_bundle.issues);
    issues.extend(embedded.issues);
    issues.extend(metadata.issues);
    issues.extend(validate::validate(
        &document,
        build_cfg.size_ceiling,
        build_cfg.strict,
    ));

    let output_path = config.output_path();
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::Output(output_path.clone(), e))?;
    }
    fs::write(&output_path, &document).map_err(|e| BuildError::Output(output_path, e))?;

    let success = !issues.iter().any(ValidationIssue::is_error);
    Ok(BuildResult {
        byte_size: document.len(),
        document,
        issues,
        duration: started.elapsed(),
        success,
    })
}

/// Asset table block: escaped JSON in an `application/json` script element.
/// The DOM unescapes text content, so the runtime can `JSON.parse` it.
fn render_asset_block(embedded: &embed::EmbedOutput) -> String {
    format!(
        r#"<script type="application/json" id="{ASSET_BLOCK_ID}">{}</script>"#,
        escape(&embedded.to_json())
    )
}

/// Shared handle used by the serve loop.
pub type SharedResult = Arc<BuildResult>;
