//! Live-preview push protocol.
//!
//! JSON messages exchanged over WebSocket between the dev orchestrator and
//! browser clients.
//!
//! # Message Types
//!
//! - server → client: `reload`, `build-success`, `build-error`, `status`
//! - client → server: `rebuild-request`, `status-request`

use serde::{Deserialize, Serialize};

use crate::error::{Severity, ValidationIssue};

/// Push message sent over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DevMessage {
    /// Reload the preview (sent after a successful build).
    Reload,

    /// Build finished without error-severity issues.
    BuildSuccess {
        /// Build wall time in milliseconds.
        #[serde(rename = "duration")]
        duration_ms: u64,
    },

    /// Build failed; the previous preview stays up.
    BuildError { issues: Vec<IssuePayload> },

    /// Client asks for one rebuild.
    RebuildRequest,

    /// Client asks for orchestrator status.
    StatusRequest,

    /// Status reply. Field keys are camelCase on the wire.
    Status {
        building: bool,
        /// Unix millis of the last finished build, 0 when none yet.
        #[serde(rename = "lastBuildTimestamp")]
        last_build_timestamp: u64,
        #[serde(rename = "subscriberCount")]
        subscriber_count: usize,
    },
}

/// Wire form of a [`ValidationIssue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePayload {
    pub severity: Severity,
    pub message: String,
}

impl From<&ValidationIssue> for IssuePayload {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            severity: issue.severity,
            message: issue.message.clone(),
        }
    }
}

impl DevMessage {
    /// Build-error message from a build's issue list.
    pub fn build_error(issues: &[ValidationIssue]) -> Self {
        Self::BuildError {
            issues: issues.iter().map(IssuePayload::from).collect(),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }

    /// Parse from JSON string.
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
