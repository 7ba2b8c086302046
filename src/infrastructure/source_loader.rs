use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::domain::events::TranslationUnit;
use crate::domain::source_kind::SourceKind;
use crate::infrastructure::front_end_for;

/// An input file and the front end that reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl SourceFile {
    /// Read the file and run its front end.
    pub fn load(&self) -> crate::error::Result<TranslationUnit> {
        let path = self.path.display().to_string();
        let source = fs::read_to_string(&self.path)?;
        let events = front_end_for(self.kind).extract(&path, &source)?;
        Ok(TranslationUnit::new(path, events))
    }
}

pub struct SourceLoader;

impl SourceLoader {
    /// Expand files and folders into the list of analyzable inputs.
    ///
    /// Explicit files must have a known kind; folders are walked recursively,
    /// skipping `target` and `.git`. The result is sorted by path and
    /// deduplicated.
    pub fn collect(inputs: &[PathBuf]) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                Self::collect_recursive(input, &mut files)
                    .with_context(|| format!("Failed to scan folder {}", input.display()))?;
            } else {
                let kind = SourceKind::from_path(input).with_context(|| {
                    format!("Unsupported input file (expected .rs, .jsonl or .events): {}", input.display())
                })?;
                files.push(SourceFile {
                    path: input.clone(),
                    kind,
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files.dedup_by(|a, b| a.path == b.path);
        debug!(count = files.len(), "collected input files");
        Ok(files)
    }

    fn collect_recursive(dir: &Path, out: &mut Vec<SourceFile>) -> Result<()> {
        if dir.ends_with("target") || dir.ends_with(".git") {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_recursive(&path, out)?;
            } else if let Some(kind) = SourceKind::from_path(&path) {
                out.push(SourceFile { path, kind });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collects_known_kinds_and_skips_target() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("target/debug")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("tu.jsonl"), "").unwrap();
        fs::write(dir.path().join("target/debug/build.rs"), "fn x() {}").unwrap();

        let files = SourceLoader::collect(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(names, vec![PathBuf::from("src/main.rs"), PathBuf::from("tu.jsonl")]);
        assert_eq!(files[0].kind, SourceKind::Rust);
        assert_eq!(files[1].kind, SourceKind::EventStream);
    }

    #[test]
    fn test_unknown_explicit_file_is_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sample.c");
        fs::write(&file, "int main() { return 0; }").unwrap();
        assert!(SourceLoader::collect(&[file]).is_err());
    }
}
