//! Composite document validation.
//!
//! Three independent checks: structural well-formedness, feature
//! completeness, and size-ceiling compliance. All three always run, even
//! after an earlier one fails, so a single pass reports every defect.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::bundle::OFFLINE_MARKER;
use crate::error::{IssueCode, ValidationIssue};
use crate::manifest::METADATA_BLOCK_ID;

/// Validate a composed document against the configured ceiling.
pub fn validate(document: &str, size_ceiling: u64, strict: bool) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_well_formed(document, &mut issues);
    check_features(document, &mut issues);
    check_size(document, size_ceiling, strict, &mut issues);
    issues
}

/// (a) Structural: the document must parse as well-formed XML.
fn check_well_formed(document: &str, issues: &mut Vec<ValidationIssue>) {
    let mut reader = Reader::from_str(document);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                issues.push(ValidationIssue::error(
                    IssueCode::Structural,
                    format!("document is not well-formed at byte {}: {e}", reader.buffer_position()),
                ));
                break;
            }
        }
    }
}

/// (b) Feature completeness: metadata block, executable logic block, and
/// the declared offline capability.
fn check_features(document: &str, issues: &mut Vec<ValidationIssue>) {
    if !document.contains(METADATA_BLOCK_ID) {
        issues.push(ValidationIssue::error(
            IssueCode::MissingFeature,
            format!("no metadata block (element id `{METADATA_BLOCK_ID}`) in document"),
        ));
    }
    if !document.contains("<script") {
        issues.push(ValidationIssue::error(
            IssueCode::MissingFeature,
            "no executable logic block (<script>) in document",
        ));
    }
    if !document.contains(OFFLINE_MARKER) {
        issues.push(ValidationIssue::error(
            IssueCode::MissingFeature,
            format!("offline capability `{OFFLINE_MARKER}` not declared in document"),
        ));
    }
}

/// (c) Size ceiling: exactly at the ceiling passes, one byte over reports.
fn check_size(document: &str, size_ceiling: u64, strict: bool, issues: &mut Vec<ValidationIssue>) {
    let byte_size = document.len() as u64;
    if byte_size > size_ceiling {
        issues.push(ValidationIssue::size_limit(
            format!("document is {byte_size} bytes, over the {size_ceiling} byte ceiling"),
            strict,
        ));
    }
}
