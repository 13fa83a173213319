//! Definitions, references, and per-file symbol extraction output.
//!
//! Definitions and their call references form an arbitrarily cyclic directed
//! graph. Definitions never hold each other; edges are `(from_id, to_id)`
//! tuples over dense 32-bit node ids assigned at aggregation time, with id 0
//! reserved for "unresolved".

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Kind of a top-level or nested declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Method,
    Variable,
    Class,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Internal,
    Unknown,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Unknown => "unknown",
        }
    }
}

/// A declaration extracted from one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub visibility: Visibility,
    pub exported: bool,
    /// Receiver type for methods.
    pub receiver: Option<String>,
    pub ffi_exported: bool,
    pub in_test_file: bool,
    /// Stable identity hash (blake3, first 16 hex chars) for cross-run
    /// tracking; survives node-id reassignment.
    pub identity: String,
    /// Dense node id assigned during aggregation; 0 means unresolved.
    pub node_id: u32,
}

/// Reference edge type between two definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceType {
    DirectCall,
    IndirectCall,
    DynamicDispatch,
    Import,
    TypeReference,
}

/// Directed reference between resolved nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from: u32,
    pub to: u32,
    pub reference_type: ReferenceType,
    pub confidence: f32,
}

impl ReferenceEdge {
    /// Confidence is clamped at assignment time, not at read time.
    pub fn new(from: u32, to: u32, reference_type: ReferenceType, confidence: f32) -> Self {
        Self {
            from,
            to,
            reference_type,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// A textual call site recorded before name resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallReference {
    /// Enclosing function name; empty for file-scope references (imports).
    pub caller: String,
    pub callee: String,
    /// Receiver type hint for method calls, when extractable.
    pub receiver: Option<String>,
    pub file: String,
    pub line: u32,
    pub reference_type: ReferenceType,
}

/// Interface-implementation hint (`implements` clauses and heritage lists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplHint {
    pub interface: String,
    pub implementor: String,
}

/// Statements following a terminator inside one function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreachableSpan {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub reason: String,
}

/// Everything the symbol extractor produces for one file. Outputs are
/// thread-local during the parallel phase; merging happens afterwards.
#[derive(Debug, Clone, Default)]
pub struct FileSymbols {
    pub file: String,
    /// Module/package identifier when the language declares one.
    pub module: Option<String>,
    pub definitions: Vec<Definition>,
    pub calls: Vec<CallReference>,
    pub imports: Vec<String>,
    pub impl_hints: Vec<ImplHint>,
    pub unreachable: Vec<UnreachableSpan>,
    /// Occurrence count of every identifier in the file; feeds the
    /// usage-fallback dead-code mode.
    pub identifiers: FxHashMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_confidence_clamped_at_construction() {
        let over = ReferenceEdge::new(1, 2, ReferenceType::DirectCall, 1.7);
        assert_eq!(over.confidence, 1.0);

        let under = ReferenceEdge::new(1, 2, ReferenceType::Import, -0.2);
        assert_eq!(under.confidence, 0.0);

        let mid = ReferenceEdge::new(1, 2, ReferenceType::IndirectCall, 0.7);
        assert_eq!(mid.confidence, 0.7);
    }

    #[test]
    fn test_visibility_str() {
        assert_eq!(Visibility::Public.as_str(), "public");
        assert_eq!(Visibility::Unknown.as_str(), "unknown");
    }
}
