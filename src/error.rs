//! Build error taxonomy and validation issue types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ValidationIssue
// ============================================================================

/// Severity of a reported issue. Only `Error` marks a build as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Machine-readable issue category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    /// Source artifact could not be read (scan continues).
    ReadError,
    /// Minification/optimization failed, unprocessed content used instead.
    TransformError,
    /// Asset extension not in the MIME table, generic type used.
    UnknownMime,
    /// Manifest missing or unparseable, defaults used.
    ManifestFallback,
    /// Composite document is not well-formed markup.
    Structural,
    /// A required feature block is absent from the composite document.
    MissingFeature,
    /// Output crossed the configured size ceiling.
    SizeLimitExceeded,
}

/// A single issue discovered during a build. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

impl ValidationIssue {
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    /// Size-ceiling issue, promoted to error under strict mode.
    pub fn size_limit(message: impl Into<String>, strict: bool) -> Self {
        if strict {
            Self::error(IssueCode::SizeLimitExceeded, message)
        } else {
            Self::warning(IssueCode::SizeLimitExceeded, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

// ============================================================================
// CompositionError
// ============================================================================

/// Fatal placeholder-substitution failure. Aborts the current build attempt;
/// no document is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// The skeleton contains a placeholder with no supplied value.
    #[error("unresolved placeholder `{{{{{0}}}}}` in skeleton")]
    Unresolved(String),

    /// A supplied value has no matching placeholder in the skeleton.
    #[error("skeleton is missing placeholder `{{{{{0}}}}}`")]
    Missing(String),

    /// The same placeholder occurs more than once in the skeleton.
    #[error("placeholder `{{{{{0}}}}}` occurs {1} times in skeleton, expected exactly once")]
    Duplicate(String, usize),
}

// ============================================================================
// BuildError
// ============================================================================

/// Errors that abort a single build attempt.
///
/// Per-artifact read failures and transform failures are NOT here: those
/// degrade into [`ValidationIssue`]s and the build continues.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read skeleton template `{0}`")]
    Template(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error("failed to write output `{0}`")]
    Output(PathBuf, #[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_error_display_shows_token() {
        let err = CompositionError::Unresolved("METADATA".to_string());
        assert_eq!(
            err.to_string(),
            "unresolved placeholder `{{METADATA}}` in skeleton"
        );

        let err = CompositionError::Duplicate("JS".to_string(), 2);
        assert!(err.to_string().contains("`{{JS}}` occurs 2 times"));
    }

    #[test]
    fn test_size_limit_severity_follows_strict_flag() {
        assert_eq!(
            ValidationIssue::size_limit("too big", false).severity,
            Severity::Warning
        );
        assert_eq!(
            ValidationIssue::size_limit("too big", true).severity,
            Severity::Error
        );
    }

    #[test]
    fn test_issue_serializes_with_lowercase_severity() {
        let issue = ValidationIssue::error(IssueCode::Structural, "mismatched tag");
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains(r#""severity":"error""#));
        assert!(json.contains(r#""code":"structural""#));
    }
}
