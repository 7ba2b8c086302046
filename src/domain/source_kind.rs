/// Source Kind Module
///
/// Decides how an input file is turned into front-end events, and whether a
/// declaration's location counts as user code.

use std::path::Path;

/// Kinds of input callseq understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Rust source, read by the `syn` front end
    Rust,
    /// JSON lines of front-end events written by an external tool
    EventStream,
}

impl SourceKind {
    /// Infer the kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<SourceKind> {
        match ext.to_lowercase().as_str() {
            "rs" => Some(SourceKind::Rust),
            "jsonl" | "events" => Some(SourceKind::EventStream),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<SourceKind> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Rust => "Rust",
            SourceKind::EventStream => "event stream",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Extensions of files whose function bodies count as user code.
const USER_CODE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "rs"];

/// Whether a declaration located in `file` is user code (a physical source
/// file rather than a header).
pub fn is_user_code_path(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| USER_CODE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(SourceKind::from_extension("rs"), Some(SourceKind::Rust));
        assert_eq!(SourceKind::from_extension("JSONL"), Some(SourceKind::EventStream));
        assert_eq!(SourceKind::from_extension("events"), Some(SourceKind::EventStream));
        assert_eq!(SourceKind::from_extension("c"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(SourceKind::from_path(Path::new("src/main.rs")), Some(SourceKind::Rust));
        assert_eq!(SourceKind::from_path(Path::new("out/tu.jsonl")), Some(SourceKind::EventStream));
        assert_eq!(SourceKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_user_code_paths() {
        assert!(is_user_code_path("sample/some_test.c"));
        assert!(is_user_code_path("src/lib.rs"));
        assert!(is_user_code_path("x.cpp"));
        assert!(!is_user_code_path("sample/externFunc.h"));
        assert!(!is_user_code_path("stdio"));
    }
}
