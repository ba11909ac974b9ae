//! Template composition: exact placeholder substitution.
//!
//! The skeleton document contains uniquely named `{{NAME}}` placeholders.
//! Placeholder positions are located in the *skeleton only* and the output
//! is spliced from skeleton segments and supplied values. A value that
//! happens to contain placeholder-shaped text therefore survives verbatim;
//! there is no global find-and-replace over the growing output.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CompositionError;

/// `{{NAME}}` tokens: uppercase ASCII name, digits and underscores allowed.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z][A-Z0-9_]*)\}\}").unwrap());

/// The transient composite document of one build: skeleton text plus the
/// placeholder → value mapping.
#[derive(Debug)]
pub struct CompositeDocument<'a> {
    skeleton: &'a str,
    values: BTreeMap<&'a str, &'a str>,
}

impl<'a> CompositeDocument<'a> {
    pub fn new(skeleton: &'a str) -> Self {
        Self {
            skeleton,
            values: BTreeMap::new(),
        }
    }

    /// Supply a value for one placeholder name (without braces).
    pub fn set(&mut self, name: &'a str, value: &'a str) -> &mut Self {
        self.values.insert(name, value);
        self
    }

    /// Substitute every named placeholder exactly once.
    ///
    /// Errors (all fatal to the build attempt):
    /// - a skeleton placeholder with no supplied value
    /// - a supplied value whose placeholder is absent from the skeleton
    /// - a placeholder occurring more than once in the skeleton
    pub fn compose(&self) -> Result<String, CompositionError> {
        // Locate placeholder tokens in the skeleton, in document order.
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        let mut sites: Vec<(std::ops::Range<usize>, &str)> = Vec::new();

        for caps in PLACEHOLDER.captures_iter(self.skeleton) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str();
            *seen.entry(name).or_insert(0) += 1;
            sites.push((token.range(), name));
        }

        for (name, count) in &seen {
            if *count > 1 {
                return Err(CompositionError::Duplicate(name.to_string(), *count));
            }
            if !self.values.contains_key(name) {
                return Err(CompositionError::Unresolved(name.to_string()));
            }
        }
        for name in self.values.keys() {
            if !seen.contains_key(name) {
                return Err(CompositionError::Missing(name.to_string()));
            }
        }

        // Splice skeleton segments and values.
        let mut output = String::with_capacity(
            self.skeleton.len() + self.values.values().map(|v| v.len()).sum::<usize>(),
        );
        let mut cursor = 0;
        for (range, name) in sites {
            output.push_str(&self.skeleton[cursor..range.start]);
            output.push_str(self.values[name]);
            cursor = range.end;
        }
        output.push_str(&self.skeleton[cursor..]);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutes_each_placeholder_once() {
        let mut doc = CompositeDocument::new("<a>{{X}}</a><b>{{Y}}</b>");
        doc.set("X", "one").set("Y", "two");
        assert_eq!(doc.compose().unwrap(), "<a>one</a><b>two</b>");
    }

    #[test]
    fn test_no_leftover_tokens() {
        let mut doc = CompositeDocument::new("{{JS}}|{{CSS}}|{{METADATA}}");
        doc.set("JS", "j").set("CSS", "c").set("METADATA", "m");
        let out = doc.compose().unwrap();
        assert!(!PLACEHOLDER.is_match(&out));
    }

    #[test]
    fn test_value_containing_placeholder_text_survives_verbatim() {
        let mut doc = CompositeDocument::new("<script>{{JS}}</script><style>{{CSS}}</style>");
        // User code coincidentally contains a placeholder-shaped substring
        doc.set("JS", r#"var tpl = "{{CSS}}";"#).set("CSS", "body{}");
        let out = doc.compose().unwrap();
        assert!(out.contains(r#"var tpl = "{{CSS}}";"#));
        assert!(out.contains("<style>body{}</style>"));
    }

    #[test]
    fn test_unresolved_placeholder_is_fatal() {
        let doc = CompositeDocument::new("{{JS}}");
        assert_eq!(
            doc.compose().unwrap_err(),
            CompositionError::Unresolved("JS".to_string())
        );
    }

    #[test]
    fn test_missing_placeholder_is_fatal() {
        // Skeleton omits {{METADATA}}: the error names the missing target
        let mut doc = CompositeDocument::new("<script>{{JS}}</script>");
        doc.set("JS", "x").set("METADATA", "m");
        assert_eq!(
            doc.compose().unwrap_err(),
            CompositionError::Missing("METADATA".to_string())
        );
    }

    #[test]
    fn test_duplicate_placeholder_is_fatal() {
        let mut doc = CompositeDocument::new("{{JS}} and {{JS}}");
        doc.set("JS", "x");
        assert_eq!(
            doc.compose().unwrap_err(),
            CompositionError::Duplicate("JS".to_string(), 2)
        );
    }

    #[test]
    fn test_lowercase_braces_are_not_placeholders() {
        let mut doc = CompositeDocument::new("{{js}} {{JS}}");
        doc.set("JS", "x");
        assert_eq!(doc.compose().unwrap(), "{{js}} x");
    }

    #[test]
    fn test_empty_skeleton_with_no_values() {
        let doc = CompositeDocument::new("plain text");
        assert_eq!(doc.compose().unwrap(), "plain text");
    }
}
