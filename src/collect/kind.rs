//! Source artifact classification.

use std::path::Path;

/// Kind of source artifact, inferred from the file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Executable logic (.js / .mjs)
    Code,
    /// Stylesheet (.css)
    Style,
    /// Installable-app manifest (manifest.json / *.webmanifest)
    Manifest,
    /// Anything else, embedded as a data URI
    Asset,
}

impl ArtifactKind {
    /// Classify a path. Manifest detection runs first because
    /// `manifest.json` would otherwise fall through as an asset.
    pub fn from_path(path: &Path) -> Self {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        if name.eq_ignore_ascii_case("manifest.json") || ext.eq_ignore_ascii_case("webmanifest") {
            return Self::Manifest;
        }

        match ext.to_ascii_lowercase().as_str() {
            "js" | "mjs" => Self::Code,
            "css" => Self::Style,
            _ => Self::Asset,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Style => "style",
            Self::Manifest => "manifest",
            Self::Asset => "asset",
        }
    }
}
