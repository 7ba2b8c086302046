//! Analyzer options shared by ingestion, synthesis and rendering.

use serde::{Deserialize, Serialize};

/// Default expansion depth for sequence synthesis.
pub const DEFAULT_SEQUENCE_DEPTH: i64 = 5;

/// Knobs consumed by the core. Loaded from TOML and/or CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerOptions {
    /// Record stdlib/system callees as leaf nodes instead of dropping them
    pub include_stdlib_leaves: bool,
    /// Label indirect calls `(indirect:<hint>)` instead of `(indirect)`
    pub indirect_label_with_hint: bool,
    /// Requested depth; see [`AnalyzerOptions::effective_depth`]
    pub sequence_max_depth: i64,
    /// Explicit root; auto-selected when `None`
    pub sequence_root: Option<String>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            include_stdlib_leaves: false,
            indirect_label_with_hint: false,
            sequence_max_depth: DEFAULT_SEQUENCE_DEPTH,
            sequence_root: None,
        }
    }
}

impl AnalyzerOptions {
    /// Depth budget with values below 1 clamped up to 1.
    pub fn effective_depth(&self) -> usize {
        usize::try_from(self.sequence_max_depth.max(1)).unwrap_or(usize::MAX)
    }

    /// Explicit root, ignoring an empty string.
    pub fn root(&self) -> Option<&str> {
        self.sequence_root.as_deref().filter(|r| !r.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = AnalyzerOptions::default();
        assert!(!opts.include_stdlib_leaves);
        assert!(!opts.indirect_label_with_hint);
        assert_eq!(opts.effective_depth(), 5);
        assert!(opts.root().is_none());
    }

    #[test]
    fn test_depth_clamp() {
        let mut opts = AnalyzerOptions::default();
        opts.sequence_max_depth = 0;
        assert_eq!(opts.effective_depth(), 1);
        opts.sequence_max_depth = -7;
        assert_eq!(opts.effective_depth(), 1);
        opts.sequence_max_depth = 3;
        assert_eq!(opts.effective_depth(), 3);
    }

    #[test]
    fn test_empty_root_is_auto() {
        let opts = AnalyzerOptions {
            sequence_root: Some(String::new()),
            ..Default::default()
        };
        assert!(opts.root().is_none());
    }
}
