//! Source collection: enumerate the source tree, classify entries, read
//! content, compute content hashes.
//!
//! An unreadable entry yields a `ReadError` issue and the scan continues;
//! no single bad file aborts a build.

mod hash;
mod kind;

pub use hash::ContentHash;
pub use kind::ArtifactKind;

use std::path::{Path, PathBuf};

use crate::config::PackConfig;
use crate::error::{IssueCode, ValidationIssue};

/// A classified, hashed source file. Ephemeral per scan.
#[derive(Debug, Clone)]
pub struct SourceArtifact {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the source root, with `/` separators (stable
    /// across platforms, used for ordering and asset names).
    pub rel: String,
    pub kind: ArtifactKind,
    pub content: Vec<u8>,
    pub hash: ContentHash,
}

/// Result of one source scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Artifacts sorted by relative path (deterministic build order).
    pub artifacts: Vec<SourceArtifact>,
    /// Read errors collected along the way.
    pub issues: Vec<ValidationIssue>,
}

impl ScanOutcome {
    /// Borrow all artifacts of one kind, preserving scan order.
    pub fn of_kind(&self, kind: ArtifactKind) -> Vec<&SourceArtifact> {
        self.artifacts.iter().filter(|a| a.kind == kind).collect()
    }
}

/// Scan the configured source root.
///
/// The output document, the skeleton template, and the config file are
/// excluded so a build never ingests its own products. Hidden files and
/// editor temp files are skipped.
pub fn scan_sources(config: &PackConfig) -> ScanOutcome {
    let source_dir = config.source_dir();
    let mut outcome = ScanOutcome::default();

    if !source_dir.exists() {
        outcome.issues.push(ValidationIssue::warning(
            IssueCode::ReadError,
            format!("source directory `{}` does not exist", source_dir.display()),
        ));
        return outcome;
    }

    let excluded = [
        config.output_path(),
        config.template_path(),
        config.config_path.clone(),
    ];

    scan_recursive(&source_dir, &source_dir, &excluded, &mut outcome);
    outcome.artifacts.sort_by(|a, b| a.rel.cmp(&b.rel));
    outcome
}

fn scan_recursive(dir: &Path, base: &Path, excluded: &[PathBuf], outcome: &mut ScanOutcome) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            outcome.issues.push(ValidationIssue::warning(
                IssueCode::ReadError,
                format!("cannot read directory `{}`: {e}", dir.display()),
            ));
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if is_hidden_or_temp(&path) || excluded.iter().any(|ex| same_file(ex, &path)) {
            continue;
        }

        if path.is_dir() {
            // A symlinked directory could point back into the tree and
            // recurse forever
            let symlinked = entry.file_type().map(|t| t.is_symlink()).unwrap_or(true);
            if !symlinked {
                scan_recursive(&path, base, excluded, outcome);
            }
            continue;
        }

        match std::fs::read(&path) {
            Ok(content) => {
                let kind = ArtifactKind::from_path(&path);
                let rel = relative_name(&path, base);
                crate::debug!("build"; "collected {} `{rel}`", kind.label());
                let hash = ContentHash::of(&content);
                outcome.artifacts.push(SourceArtifact {
                    kind,
                    path,
                    rel,
                    hash,
                    content,
                });
            }
            Err(e) => {
                outcome.issues.push(ValidationIssue::warning(
                    IssueCode::ReadError,
                    format!("cannot read `{}`: {e}", path.display()),
                ));
            }
        }
    }
}

/// Relative path with forward slashes.
fn relative_name(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path comparison that tolerates one side not existing yet.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Hidden files and editor temp/backup artifacts. Shared by the source
/// scan and the watch debouncer so the two filters cannot drift.
pub fn is_hidden_or_temp(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> PackConfig {
        let mut config = PackConfig::default();
        config.root = root.to_path_buf();
        config
    }

    #[test]
    fn test_scan_classifies_and_sorts() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("app.js"), "console.log(1)").unwrap();
        fs::write(src.join("main.css"), "body{}").unwrap();
        fs::write(src.join("manifest.json"), "{}").unwrap();
        fs::write(src.join("lib").join("icon.png"), b"\x89PNG").unwrap();

        let outcome = scan_sources(&config_for(dir.path()));
        assert!(outcome.issues.is_empty());

        let rels: Vec<_> = outcome.artifacts.iter().map(|a| a.rel.as_str()).collect();
        assert_eq!(rels, vec!["app.js", "lib/icon.png", "main.css", "manifest.json"]);

        assert_eq!(outcome.of_kind(ArtifactKind::Code).len(), 1);
        assert_eq!(outcome.of_kind(ArtifactKind::Style).len(), 1);
        assert_eq!(outcome.of_kind(ArtifactKind::Manifest).len(), 1);
        assert_eq!(outcome.of_kind(ArtifactKind::Asset).len(), 1);
    }

    #[test]
    fn test_scan_skips_output_and_template() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("app.js"), "x").unwrap();

        // Put output and template inside the source tree
        let mut config = config_for(dir.path());
        config.build.output = PathBuf::from("src/app.svg");
        config.build.template = PathBuf::from("src/template.svg");
        fs::write(src.join("app.svg"), "<svg/>").unwrap();
        fs::write(src.join("template.svg"), "<svg/>").unwrap();

        let outcome = scan_sources(&config);
        let rels: Vec<_> = outcome.artifacts.iter().map(|a| a.rel.as_str()).collect();
        assert_eq!(rels, vec!["app.js"]);
    }

    #[test]
    fn test_scan_skips_hidden_and_temp() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("app.js"), "x").unwrap();
        fs::write(src.join(".DS_Store"), "junk").unwrap();
        fs::write(src.join("app.js~"), "junk").unwrap();
        fs::write(src.join("notes.tmp"), "junk").unwrap();

        let outcome = scan_sources(&config_for(dir.path()));
        assert_eq!(outcome.artifacts.len(), 1);
        assert_eq!(outcome.artifacts[0].rel, "app.js");
    }

    #[test]
    #[cfg(unix)]
    fn test_symlinked_dir_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("app.js"), "x").unwrap();
        // src/cycle -> src: following it would never bottom out
        std::os::unix::fs::symlink(&src, src.join("cycle")).unwrap();

        let outcome = scan_sources(&config_for(dir.path()));
        let rels: Vec<_> = outcome.artifacts.iter().map(|a| a.rel.as_str()).collect();
        assert_eq!(rels, vec!["app.js"]);
    }

    #[test]
    fn test_missing_source_dir_is_one_warning() {
        let dir = TempDir::new().unwrap();
        let outcome = scan_sources(&config_for(dir.path()));
        assert!(outcome.artifacts.is_empty());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].code, IssueCode::ReadError);
        assert!(!outcome.issues[0].is_error());
    }

    #[test]
    fn test_hash_tracks_content() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("app.js"), "v1").unwrap();

        let first = scan_sources(&config_for(dir.path()));
        let again = scan_sources(&config_for(dir.path()));
        assert_eq!(first.artifacts[0].hash, again.artifacts[0].hash);

        fs::write(src.join("app.js"), "v2").unwrap();
        let changed = scan_sources(&config_for(dir.path()));
        assert_ne!(first.artifacts[0].hash, changed.artifacts[0].hash);
    }
}
