//! Options file (`callseq.toml`).
//!
//! ```toml
//! include_stdlib_leaves = true
//! indirect_label_with_hint = false
//! sequence_max_depth = 3
//! sequence_root = "main"
//! emit = "puml"
//! threads = 4
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::domain::options::AnalyzerOptions;
use crate::error::Result;
use crate::ports::EmitFormat;

/// Contents of an options file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub analyzer: AnalyzerOptions,
    pub emit: Option<EmitFormat>,
    /// Worker threads, 0 for automatic
    pub threads: usize,
}

impl ConfigFile {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
