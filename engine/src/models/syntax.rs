//! Parsed-source data model shared by every analyzer.
//!
//! A [`ParsedFile`] owns the source text and its tree-sitter parse tree for
//! the duration of one file's analyzer chain; analyzers hold a read-only
//! borrow and never share trees across workers.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Closed set of languages the engine understands, detected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Rust,
    Python,
    TypeScript,
    Tsx,
    JavaScript,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Bash,
    Unknown,
}

impl Language {
    /// Extension-based detection. Anything outside the closed set maps to
    /// [`Language::Unknown`], which parsers reject with an
    /// `unsupported-language` error.
    pub fn from_path(path: &Path) -> Language {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "go" => Language::Go,
            "rs" => Language::Rust,
            "py" | "pyi" => Language::Python,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "sh" | "bash" => Language::Bash,
            _ => Language::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Bash => "bash",
            Language::Unknown => "unknown",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Language::Unknown)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One parsed source file: bytes, detected language, and the parse tree.
///
/// Trees are read-only after parsing. Malformed source still yields a tree
/// (with error subtrees); parsing never fails for syntactic reasons.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub language: Language,
    pub source: String,
    pub tree: tree_sitter::Tree,
}

impl ParsedFile {
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Source text of a node. Falls back to the empty string on
    /// out-of-range byte offsets, which only occur on malformed trees.
    pub fn node_text(&self, node: tree_sitter::Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// 1-indexed start line of a node.
    pub fn start_line(node: tree_sitter::Node<'_>) -> u32 {
        node.start_position().row as u32 + 1
    }

    /// 1-indexed end line of a node.
    pub fn end_line(node: tree_sitter::Node<'_>) -> u32 {
        node.end_position().row as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection_by_extension() {
        assert_eq!(Language::from_path(Path::new("main.go")), Language::Go);
        assert_eq!(Language::from_path(Path::new("lib.rs")), Language::Rust);
        assert_eq!(Language::from_path(Path::new("app.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("ui.tsx")), Language::Tsx);
        assert_eq!(Language::from_path(Path::new("x.ts")), Language::TypeScript);
        assert_eq!(Language::from_path(Path::new("x.cs")), Language::CSharp);
        assert_eq!(Language::from_path(Path::new("run.sh")), Language::Bash);
        assert_eq!(Language::from_path(Path::new("README.md")), Language::Unknown);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Unknown);
    }

    #[test]
    fn test_unknown_is_unsupported() {
        assert!(!Language::Unknown.is_supported());
        assert!(Language::Go.is_supported());
    }

    #[test]
    fn test_language_display_matches_tag() {
        assert_eq!(Language::Cpp.to_string(), "cpp");
        assert_eq!(Language::TypeScript.to_string(), "typescript");
    }
}
