//! Parser abstraction over tree-sitter grammars.
//!
//! One [`SourceParser`] owns a lazily initialized `tree_sitter::Parser` per
//! language; workers hold their own instance so grammar setup is amortized
//! across the files a worker processes and parsers are never shared.
//!
//! Parsing is deterministic for a given source. Errors arise only from I/O
//! or an unsupported extension; malformed source yields a tree with error
//! subtrees and is never an error.

use rustc_hash::FxHashMap;
use std::path::Path;
use tree_sitter::Node;

use crate::models::error::EngineError;
use crate::models::syntax::{Language, ParsedFile};

pub struct SourceParser {
    parsers: FxHashMap<Language, tree_sitter::Parser>,
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser {
    pub fn new() -> Self {
        Self {
            parsers: FxHashMap::default(),
        }
    }

    /// Extension-based language detection.
    pub fn language_of(path: &Path) -> Language {
        Language::from_path(path)
    }

    /// Read and parse a file from disk.
    pub fn parse_path(&mut self, path: &Path) -> Result<ParsedFile, EngineError> {
        let language = Self::language_of(path);
        if !language.is_supported() {
            return Err(EngineError::UnsupportedLanguage {
                path: path.to_path_buf(),
            });
        }
        let source = std::fs::read_to_string(path)?;
        self.parse_source(path, source, language)
    }

    /// Parse in-memory source. The content-reader indirection for virtual
    /// filesystems goes through here.
    pub fn parse_source(
        &mut self,
        path: &Path,
        source: String,
        language: Language,
    ) -> Result<ParsedFile, EngineError> {
        let parser = self.parser_for(language, path)?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| EngineError::Parse {
                file: path.to_path_buf(),
                message: "parser produced no tree".to_string(),
            })?;

        Ok(ParsedFile {
            path: path.to_path_buf(),
            language,
            source,
            tree,
        })
    }

    fn parser_for(
        &mut self,
        language: Language,
        path: &Path,
    ) -> Result<&mut tree_sitter::Parser, EngineError> {
        use std::collections::hash_map::Entry;

        match self.parsers.entry(language) {
            Entry::Occupied(occupied) => Ok(occupied.into_mut()),
            Entry::Vacant(vacant) => {
                let grammar = grammar(language).ok_or_else(|| EngineError::UnsupportedLanguage {
                    path: path.to_path_buf(),
                })?;
                let mut parser = tree_sitter::Parser::new();
                parser
                    .set_language(&grammar)
                    .map_err(|e| EngineError::Parse {
                        file: path.to_path_buf(),
                        message: format!("grammar initialization failed: {e}"),
                    })?;
                Ok(vacant.insert(parser))
            }
        }
    }
}

fn grammar(language: Language) -> Option<tree_sitter::Language> {
    match language {
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
        Language::C => Some(tree_sitter_c::LANGUAGE.into()),
        Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
        Language::CSharp => Some(tree_sitter_c_sharp::LANGUAGE.into()),
        Language::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
        Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
        Language::Bash => Some(tree_sitter_bash::LANGUAGE.into()),
        Language::Unknown => None,
    }
}

/// Depth-first visit. The callback returns whether to descend into the
/// node's children, so subtrees can be pruned.
pub fn visit_nodes<'a, F>(node: Node<'a>, f: &mut F)
where
    F: FnMut(Node<'a>) -> bool,
{
    if !f(node) {
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            visit_nodes(child, f);
        }
    }
}

/// Like [`visit_nodes`] but hands the node-type string to the callback,
/// avoiding repeated `kind()` extraction at call sites.
pub fn visit_typed<'a, F>(node: Node<'a>, f: &mut F)
where
    F: FnMut(&'static str, Node<'a>) -> bool,
{
    if !f(node.kind(), node) {
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            visit_typed(child, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(source: &str, name: &str) -> ParsedFile {
        let mut parser = SourceParser::new();
        let path = PathBuf::from(name);
        let language = SourceParser::language_of(&path);
        parser.parse_source(&path, source.to_string(), language).unwrap()
    }

    #[test]
    fn test_parse_go_function() {
        let parsed = parse("package main\n\nfunc simple() int { return 42 }\n", "main.go");
        assert_eq!(parsed.language, Language::Go);
        assert_eq!(parsed.root().kind(), "source_file");

        let mut saw_function = false;
        visit_typed(parsed.root(), &mut |kind, _| {
            if kind == "function_declaration" {
                saw_function = true;
            }
            true
        });
        assert!(saw_function);
    }

    #[test]
    fn test_unsupported_extension_is_typed_error() {
        let mut parser = SourceParser::new();
        let err = parser
            .parse_source(
                Path::new("notes.txt"),
                "hello".to_string(),
                Language::Unknown,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported-language");
    }

    #[test]
    fn test_malformed_source_still_yields_tree() {
        let parsed = parse("func broken( {{{", "broken.go");
        assert!(parsed.root().has_error());
        // The tree is usable despite the error subtrees.
        assert!(parsed.root().child_count() > 0);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let a = parse("fn f() -> u32 { 1 }\n", "a.rs");
        let b = parse("fn f() -> u32 { 1 }\n", "a.rs");
        assert_eq!(a.root().to_sexp(), b.root().to_sexp());
    }

    #[test]
    fn test_visit_nodes_prunes_subtrees() {
        let parsed = parse("fn f() { if true { g(); } }\n", "a.rs");
        let mut kinds = Vec::new();
        visit_nodes(parsed.root(), &mut |node| {
            kinds.push(node.kind());
            // Do not descend into the function body.
            node.kind() != "block"
        });
        assert!(kinds.contains(&"function_item"));
        assert!(!kinds.contains(&"if_expression"));
    }

    #[test]
    fn test_parser_reuse_across_languages() {
        let mut parser = SourceParser::new();
        for (name, src) in [
            ("a.go", "package a\nfunc A() {}\n"),
            ("b.rs", "pub fn b() {}\n"),
            ("c.py", "def c():\n    pass\n"),
            ("d.go", "package d\nfunc D() {}\n"),
        ] {
            let path = PathBuf::from(name);
            let lang = SourceParser::language_of(&path);
            let parsed = parser.parse_source(&path, src.to_string(), lang).unwrap();
            assert!(!parsed.root().has_error(), "unexpected error in {name}");
        }
        // Three distinct grammars were initialized, the Go one only once.
        assert_eq!(parser.parsers.len(), 3);
    }
}
