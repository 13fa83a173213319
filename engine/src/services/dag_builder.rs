//! Dependency graph construction at file, function, or module granularity.
//!
//! File-scope import edges use a bidirectional substring heuristic, so
//! file-scope graphs are approximate by design; consumers that need exact
//! edges should use the function scope, where call sites resolve through a
//! name index.

use rustc_hash::FxHashMap;

use crate::models::dag::{DependencyGraph, GraphEdgeType, GraphNodeType, GraphScope};
use crate::models::symbols::{DefinitionKind, FileSymbols};

pub struct DagBuilder {
    scope: GraphScope,
}

impl DagBuilder {
    pub fn new(scope: GraphScope) -> Self {
        Self { scope }
    }

    pub fn build(&self, files: &[FileSymbols]) -> DependencyGraph {
        match self.scope {
            GraphScope::File => build_file_graph(files),
            GraphScope::Function => build_function_graph(files),
            GraphScope::Module => build_module_graph(files),
        }
    }
}

fn build_file_graph(files: &[FileSymbols]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let mut ids = Vec::with_capacity(files.len());

    for file in files {
        let id = graph.add_node(
            file.file.clone(),
            GraphNodeType::File,
            file.file.clone(),
            1,
        );
        ids.push(id);
    }

    for (i, file) in files.iter().enumerate() {
        for import in &file.imports {
            for (j, other) in files.iter().enumerate() {
                if i != j && matches_import(&other.file, import) {
                    graph.add_edge(ids[i], ids[j], GraphEdgeType::Import);
                }
            }
        }
    }

    graph
}

/// Bidirectional substring matching between an import path and a file path.
fn matches_import(file_path: &str, import: &str) -> bool {
    if import.is_empty() {
        return false;
    }
    let no_ext = file_path
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_path);
    let stem = no_ext.rsplit(['/', '\\']).next().unwrap_or(no_ext);
    let import_tail = import
        .rsplit(['/', '.', ':'])
        .next()
        .unwrap_or(import);

    no_ext.contains(import) || import_tail == stem
}

fn build_function_graph(files: &[FileSymbols]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    // Function-name to node-id list: O(1) amortized lookup per call site.
    let mut by_name: FxHashMap<&str, Vec<u32>> = FxHashMap::default();
    let mut by_key: FxHashMap<(&str, &str), u32> = FxHashMap::default();

    for file in files {
        for def in &file.definitions {
            if !matches!(def.kind, DefinitionKind::Function | DefinitionKind::Method) {
                continue;
            }
            let id = graph.add_node(
                def.name.clone(),
                GraphNodeType::Function,
                def.file.clone(),
                def.start_line,
            );
            by_name.entry(def.name.as_str()).or_default().push(id);
            by_key.insert((def.file.as_str(), def.name.as_str()), id);
        }
    }

    for file in files {
        for call in &file.calls {
            if call.caller.is_empty() {
                continue;
            }
            let Some(&from) = by_key.get(&(call.file.as_str(), call.caller.as_str())) else {
                continue;
            };
            if let Some(targets) = by_name.get(call.callee.as_str()) {
                for &to in targets {
                    graph.add_edge(from, to, GraphEdgeType::Call);
                }
            }
        }
    }

    graph
}

fn build_module_graph(files: &[FileSymbols]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    let mut by_module: FxHashMap<&str, u32> = FxHashMap::default();

    for file in files {
        if let Some(module) = &file.module {
            if !by_module.contains_key(module.as_str()) {
                let id = graph.add_node(
                    module.clone(),
                    GraphNodeType::Module,
                    file.file.clone(),
                    1,
                );
                by_module.insert(module.as_str(), id);
            }
        }
    }

    for file in files {
        let Some(module) = &file.module else { continue };
        let Some(&from) = by_module.get(module.as_str()) else {
            continue;
        };
        for import in &file.imports {
            let tail = import.rsplit(['/', '.', ':']).next().unwrap_or(import);
            if let Some(&to) = by_module.get(tail) {
                graph.add_edge(from, to, GraphEdgeType::Reference);
            }
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parser::SourceParser;
    use crate::services::symbol_table::SymbolExtractor;
    use std::path::PathBuf;

    fn extract(source: &str, name: &str) -> FileSymbols {
        let mut parser = SourceParser::new();
        let path = PathBuf::from(name);
        let language = SourceParser::language_of(&path);
        let parsed = parser
            .parse_source(&path, source.to_string(), language)
            .unwrap();
        SymbolExtractor::extract(&parsed)
    }

    #[test]
    fn test_function_scope_call_edges() {
        let a = extract(
            "package a\n\nfunc caller() {\n\tcallee()\n}\n\nfunc callee() {}\n",
            "a.go",
        );
        let graph = DagBuilder::new(GraphScope::Function).build(&[a]);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges[0];
        assert_eq!(graph.nodes[edge.from as usize].name, "caller");
        assert_eq!(graph.nodes[edge.to as usize].name, "callee");
        assert_eq!(edge.edge_type, GraphEdgeType::Call);
    }

    #[test]
    fn test_function_scope_discards_self_loops() {
        let a = extract(
            "package a\n\nfunc recurse() {\n\trecurse()\n}\n",
            "a.go",
        );
        let graph = DagBuilder::new(GraphScope::Function).build(&[a]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_same_name_functions_all_get_edges() {
        let a = extract("package a\n\nfunc work() {}\n", "a.go");
        let b = extract("package b\n\nfunc work() {}\n", "b.go");
        let c = extract("package c\n\nfunc run() {\n\twork()\n}\n", "c.go");
        let graph = DagBuilder::new(GraphScope::Function).build(&[a, b, c]);

        // run -> both work nodes.
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_file_scope_import_matching() {
        let util = extract("package util\n\nfunc Helper() {}\n", "pkg/util/util.go");
        let main = extract(
            "package main\n\nimport \"example.com/app/pkg/util\"\n\nfunc main() {}\n",
            "cmd/main.go",
        );
        let graph = DagBuilder::new(GraphScope::File).build(&[util, main]);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges[0];
        assert_eq!(graph.nodes[edge.from as usize].file, "cmd/main.go");
        assert_eq!(graph.nodes[edge.to as usize].file, "pkg/util/util.go");
    }

    #[test]
    fn test_module_scope() {
        let a = extract("package storage\n\nfunc Put() {}\n", "storage/s.go");
        let b = extract(
            "package api\n\nimport \"example.com/app/storage\"\n\nfunc Serve() {}\n",
            "api/a.go",
        );
        let graph = DagBuilder::new(GraphScope::Module).build(&[a, b]);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges[0];
        assert_eq!(graph.nodes[edge.from as usize].name, "api");
        assert_eq!(graph.nodes[edge.to as usize].name, "storage");
    }
}
