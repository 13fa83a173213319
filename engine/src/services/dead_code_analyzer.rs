//! Dead code detection with cross-reference analysis.
//!
//! Four-phase pipeline over aggregated per-file extractions: build the
//! reference graph with dense node ids, resolve dynamic dispatch through the
//! vtable registry, mark reachability with a vectorized BFS over a
//! compressed bitset, then classify unreached definitions with confidence
//! scores. A usage-fallback mode based on textual identifier occurrence
//! serves configurations that disable graph construction.

use parking_lot::RwLock;
use roaring::RoaringBitmap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::models::config::DeadCodeConfig;
use crate::models::dead_code::{DeadCodeReport, DeadCodeSummary, DeadItem, UnreachableBlock};
use crate::models::symbols::{
    Definition, DefinitionKind, FileSymbols, ReferenceEdge, ReferenceType, Visibility,
};

/// Directories whose definitions are never reported dead.
const EXCLUDED_PATH_SEGMENTS: &[&str] = &[
    "vendor",
    "node_modules",
    "third_party",
    "external",
    ".venv",
    "site-packages",
    ".cargo",
];

/// Compressed sparse bitset over node identifiers. Run-length-compressed
/// chunks keep a mostly-reachable graph of 10^6 ids in tens of kilobytes.
pub struct SparseBitSet {
    bits: RoaringBitmap,
}

impl Default for SparseBitSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseBitSet {
    pub fn new() -> Self {
        Self {
            bits: RoaringBitmap::new(),
        }
    }

    pub fn set(&mut self, index: u32) {
        self.bits.insert(index);
    }

    pub fn is_set(&self, index: u32) -> bool {
        self.bits.contains(index)
    }

    pub fn count(&self) -> u64 {
        self.bits.len()
    }

    pub fn insert_many(&mut self, indices: impl IntoIterator<Item = u32>) {
        for index in indices {
            self.bits.insert(index);
        }
    }
}

/// Cross-language reference graph with an outgoing-edge index for
/// O(out-degree) traversal.
#[derive(Default)]
pub struct ReferenceGraph {
    pub edges: Vec<ReferenceEdge>,
    edge_index: FxHashMap<u32, Vec<usize>>,
}

impl ReferenceGraph {
    pub fn add_edge(&mut self, edge: ReferenceEdge) {
        let idx = self.edges.len();
        self.edge_index.entry(edge.from).or_default().push(idx);
        self.edges.push(edge);
    }

    pub fn outgoing(&self, from: u32) -> &[usize] {
        self.edge_index
            .get(&from)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Dynamic-dispatch resolution tables: receiver type to method table, plus
/// interface-name to implementing types.
#[derive(Default)]
pub struct VTableRegistry {
    vtables: FxHashMap<String, FxHashMap<String, u32>>,
    interface_impls: FxHashMap<String, Vec<String>>,
}

impl VTableRegistry {
    pub fn register_method(&mut self, receiver: &str, method: &str, node_id: u32) {
        self.vtables
            .entry(receiver.to_string())
            .or_default()
            .insert(method.to_string(), node_id);
    }

    pub fn register_impl(&mut self, interface: &str, implementor: &str) {
        self.interface_impls
            .entry(interface.to_string())
            .or_default()
            .push(implementor.to_string());
    }

    /// Concrete implementations of `method` for a receiver hint. An unknown
    /// or absent receiver falls back to every type implementing the method.
    pub fn resolve(&self, receiver: Option<&str>, method: &str) -> Vec<u32> {
        let mut targets = Vec::new();

        if let Some(receiver) = receiver {
            if let Some(vtable) = self.vtables.get(receiver) {
                if let Some(&id) = vtable.get(method) {
                    targets.push(id);
                }
            }
            if let Some(impls) = self.interface_impls.get(receiver) {
                for impl_type in impls {
                    if let Some(&id) = self.vtables.get(impl_type).and_then(|v| v.get(method)) {
                        targets.push(id);
                    }
                }
            }
            if !targets.is_empty() {
                return targets;
            }
        }

        for vtable in self.vtables.values() {
            if let Some(&id) = vtable.get(method) {
                targets.push(id);
            }
        }
        targets.sort_unstable();
        targets.dedup();
        targets
    }
}

/// Line coverage attached to the classification phase.
#[derive(Debug, Clone, Default)]
pub struct CoverageData {
    pub covered_lines: FxHashMap<String, FxHashSet<u32>>,
}

impl CoverageData {
    fn covers(&self, file: &str, line: u32) -> bool {
        self.covered_lines
            .get(file)
            .is_some_and(|lines| lines.contains(&line))
    }
}

struct DynamicCall {
    from: u32,
    method: String,
    receiver: Option<String>,
}

pub struct DeadCodeAnalyzer {
    config: DeadCodeConfig,
    reachability: Arc<RwLock<SparseBitSet>>,
    references: Arc<RwLock<ReferenceGraph>>,
    vtables: Arc<RwLock<VTableRegistry>>,
    entry_points: Arc<RwLock<FxHashSet<u32>>>,
    coverage: Option<CoverageData>,
    dynamic_calls: Vec<DynamicCall>,
}

impl DeadCodeAnalyzer {
    pub fn new(config: DeadCodeConfig) -> Self {
        Self {
            config,
            reachability: Arc::new(RwLock::new(SparseBitSet::new())),
            references: Arc::new(RwLock::new(ReferenceGraph::default())),
            vtables: Arc::new(RwLock::new(VTableRegistry::default())),
            entry_points: Arc::new(RwLock::new(FxHashSet::default())),
            coverage: None,
            dynamic_calls: Vec::new(),
        }
    }

    pub fn with_coverage(mut self, coverage: CoverageData) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Run the full pipeline over per-file extractions.
    pub fn analyze(&mut self, files: &[FileSymbols]) -> DeadCodeReport {
        let definitions = assign_node_ids(files);
        debug!(definitions = definitions.len(), "dead-code analysis start");

        if self.config.use_reference_graph {
            self.build_reference_graph(&definitions, files);
            self.resolve_dynamic_dispatch();
            self.mark_reachable();
            self.classify(&definitions, files)
        } else {
            self.classify_by_usage(&definitions, files)
        }
    }

    /// Phase 1: nodes, edges, and entry points.
    fn build_reference_graph(&mut self, definitions: &[Definition], files: &[FileSymbols]) {
        let mut by_name: FxHashMap<&str, Vec<u32>> = FxHashMap::default();
        let mut by_file_and_name: FxHashMap<(&str, &str), u32> = FxHashMap::default();
        for def in definitions {
            by_name.entry(def.name.as_str()).or_default().push(def.node_id);
            by_file_and_name.insert((def.file.as_str(), def.name.as_str()), def.node_id);
        }

        {
            let mut entries = self.entry_points.write();
            for def in definitions {
                if is_entry_point(def) {
                    entries.insert(def.node_id);
                }
            }
        }

        let mut references = self.references.write();
        for file in files {
            for call in &file.calls {
                let from = if call.caller.is_empty() {
                    0
                } else {
                    by_file_and_name
                        .get(&(call.file.as_str(), call.caller.as_str()))
                        .copied()
                        .unwrap_or(0)
                };

                let Some(candidates) = by_name.get(call.callee.as_str()) else {
                    continue;
                };
                for &to in candidates {
                    if to == from {
                        continue;
                    }
                    let confidence = match call.reference_type {
                        ReferenceType::DirectCall => 0.9,
                        ReferenceType::DynamicDispatch => 0.8,
                        _ => 0.7,
                    };
                    references.add_edge(ReferenceEdge::new(
                        from,
                        to,
                        call.reference_type,
                        confidence,
                    ));
                }

                if call.reference_type == ReferenceType::DynamicDispatch {
                    self.dynamic_calls.push(DynamicCall {
                        from,
                        method: call.callee.clone(),
                        receiver: call.receiver.clone(),
                    });
                }
            }

            // Imports resolve from the synthetic empty caller (id 0), which
            // is never reachable, so importees do not become entry-like.
            for import in &file.imports {
                let last = import.rsplit(['/', '.', ':']).next().unwrap_or(import);
                if let Some(candidates) = by_name.get(last) {
                    for &to in candidates {
                        references.add_edge(ReferenceEdge::new(
                            0,
                            to,
                            ReferenceType::Import,
                            0.5,
                        ));
                    }
                }
            }
        }
        drop(references);

        // VTable registry: method-kind definitions grouped by receiver.
        let mut vtables = self.vtables.write();
        for def in definitions {
            if def.kind == DefinitionKind::Method {
                if let Some(receiver) = &def.receiver {
                    vtables.register_method(receiver, &def.name, def.node_id);
                }
            }
        }
        for file in files {
            for hint in &file.impl_hints {
                vtables.register_impl(&hint.interface, &hint.implementor);
            }
        }
    }

    /// Phase 2: inject indirect-call edges for dynamic dispatch sites.
    fn resolve_dynamic_dispatch(&mut self) {
        let vtables = self.vtables.read();
        let mut references = self.references.write();

        for call in &self.dynamic_calls {
            for target in vtables.resolve(call.receiver.as_deref(), &call.method) {
                if target != call.from {
                    references.add_edge(ReferenceEdge::new(
                        call.from,
                        target,
                        ReferenceType::IndirectCall,
                        0.7,
                    ));
                }
            }
        }
    }

    /// Phase 3: BFS from the entry set over the outgoing-edge index.
    fn mark_reachable(&mut self) {
        let entries: Vec<u32> = self.entry_points.read().iter().copied().collect();
        let references = self.references.read();
        let mut reachable = self.reachability.write();

        reachable.insert_many(entries.iter().copied());
        let mut queue: VecDeque<u32> = entries.into();

        while let Some(node) = queue.pop_front() {
            for &edge_idx in references.outgoing(node) {
                let target = references.edges[edge_idx].to;
                if target != 0 && !reachable.is_set(target) {
                    reachable.set(target);
                    queue.push_back(target);
                }
            }
        }
        debug!(reachable = reachable.count(), "reachability fixpoint");
    }

    /// Phase 4: everything unset and not an entry point is dead.
    fn classify(&self, definitions: &[Definition], files: &[FileSymbols]) -> DeadCodeReport {
        let reachable = self.reachability.read();
        let entries = self.entry_points.read();

        let dead = definitions.iter().filter(|def| {
            !reachable.is_set(def.node_id) && !entries.contains(&def.node_id)
        });

        self.build_report(dead, files, true)
    }

    /// Fallback: a definition whose name never occurs beyond its own
    /// declarations is unused.
    fn classify_by_usage(&self, definitions: &[Definition], files: &[FileSymbols]) -> DeadCodeReport {
        let mut occurrences: FxHashMap<&str, u64> = FxHashMap::default();
        for file in files {
            for (name, count) in &file.identifiers {
                *occurrences.entry(name.as_str()).or_insert(0) += *count as u64;
            }
        }
        let mut declared: FxHashMap<&str, u64> = FxHashMap::default();
        for def in definitions {
            *declared.entry(def.name.as_str()).or_insert(0) += 1;
        }

        let dead = definitions.iter().filter(|def| {
            let total = occurrences.get(def.name.as_str()).copied().unwrap_or(0);
            let own = declared.get(def.name.as_str()).copied().unwrap_or(1);
            total <= own && !is_entry_point(def)
        });

        self.build_report(dead, files, false)
    }

    fn build_report<'a>(
        &self,
        dead: impl Iterator<Item = &'a Definition>,
        files: &[FileSymbols],
        graph_based: bool,
    ) -> DeadCodeReport {
        let mut items: Vec<DeadItem> = dead
            .filter(|def| !is_excluded_path(&def.file))
            .filter(|def| self.config.include_tests || !def.in_test_file)
            .filter_map(|def| {
                let confidence = self.confidence(def, graph_based);
                if confidence < self.config.confidence {
                    return None;
                }
                let reason = if graph_based {
                    "not reachable from any entry point".to_string()
                } else {
                    "name never referenced outside its declaration".to_string()
                };
                Some(DeadItem {
                    name: def.name.clone(),
                    file: def.file.clone(),
                    start_line: def.start_line,
                    end_line: def.end_line,
                    visibility: def.visibility.as_str().to_string(),
                    confidence,
                    reason,
                    kind: def.kind,
                    node_id: def.node_id,
                })
            })
            .collect();

        items.sort_by(|a, b| (&a.file, a.start_line).cmp(&(&b.file, b.start_line)));

        let mut dead_functions = Vec::new();
        let mut dead_classes = Vec::new();
        let mut dead_variables = Vec::new();
        for item in items {
            match item.kind {
                DefinitionKind::Function | DefinitionKind::Method => dead_functions.push(item),
                DefinitionKind::Class => dead_classes.push(item),
                DefinitionKind::Variable => dead_variables.push(item),
            }
        }

        let mut unreachable_code: Vec<UnreachableBlock> = files
            .iter()
            .filter(|f| !is_excluded_path(&f.file))
            .flat_map(|f| f.unreachable.iter())
            .map(|span| UnreachableBlock {
                file: span.file.clone(),
                start_line: span.start_line,
                end_line: span.end_line,
                reason: span.reason.clone(),
            })
            .collect();
        unreachable_code.sort_by(|a, b| (&a.file, a.start_line).cmp(&(&b.file, b.start_line)));

        let mut by_file: BTreeMap<String, usize> = BTreeMap::new();
        for item in dead_functions
            .iter()
            .chain(dead_classes.iter())
            .chain(dead_variables.iter())
        {
            *by_file.entry(item.file.clone()).or_insert(0) += 1;
        }

        DeadCodeReport {
            summary: DeadCodeSummary {
                total_items: dead_functions.len() + dead_classes.len() + dead_variables.len(),
                dead_functions: dead_functions.len(),
                dead_classes: dead_classes.len(),
                dead_variables: dead_variables.len(),
                unreachable_blocks: unreachable_code.len(),
                by_file,
            },
            dead_functions,
            dead_classes,
            dead_variables,
            unreachable_code,
        }
    }

    fn confidence(&self, def: &Definition, graph_based: bool) -> f32 {
        let mut confidence: f32 = if graph_based { 0.95 } else { 0.90 };

        if def.exported {
            confidence -= if graph_based { 0.25 } else { 0.30 };
        }
        if def.visibility == Visibility::Private {
            confidence += if graph_based { 0.03 } else { 0.05 };
        }
        if def.in_test_file {
            confidence -= 0.15;
        }
        if def.ffi_exported {
            confidence -= if graph_based { 0.30 } else { 0.25 };
        }
        if let Some(coverage) = &self.coverage {
            if coverage.covers(&def.file, def.start_line) {
                confidence -= 0.40;
            } else {
                confidence += 0.05;
            }
        }

        confidence.clamp(0.0, 1.0)
    }
}

/// Dense node ids start at 1; 0 stays reserved for "unresolved". The
/// counter is atomic so aggregation can run over a concurrent definition
/// stream; ids are therefore not reproducible across runs, but the set of
/// dead items is.
fn assign_node_ids(files: &[FileSymbols]) -> Vec<Definition> {
    let counter = AtomicU32::new(1);
    files
        .iter()
        .flat_map(|f| f.definitions.iter())
        .map(|def| {
            let mut def = def.clone();
            def.node_id = counter.fetch_add(1, Ordering::Relaxed);
            def
        })
        .collect()
}

fn is_excluded_path(file: &str) -> bool {
    let path = std::path::Path::new(file);
    path.components().any(|c| {
        let segment = c.as_os_str().to_string_lossy();
        EXCLUDED_PATH_SEGMENTS.contains(&segment.as_ref())
    })
}

/// Entry points are assumed reachable from outside the analyzed corpus.
fn is_entry_point(def: &Definition) -> bool {
    let name = def.name.as_str();

    if matches!(name, "main" | "init" | "Main") {
        return true;
    }
    if def.ffi_exported || def.exported {
        return true;
    }
    // Test harness entry points.
    if ["Test", "Benchmark", "Example", "Fuzz"]
        .iter()
        .any(|p| name.starts_with(p) && name.len() > p.len())
    {
        return true;
    }
    // HTTP handler heuristics.
    if name.ends_with("Handler") || name.ends_with("Controller") || name.ends_with("Endpoint") {
        return true;
    }
    if name == "ServeHTTP" {
        return true;
    }
    if ["Get", "Post", "Put", "Delete", "Patch", "Head", "Options"]
        .iter()
        .any(|verb| {
            name.strip_prefix(verb)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_uppercase())
        })
    {
        return true;
    }
    // Event handler heuristics.
    if (name.starts_with("On") || name.starts_with("Handle"))
        && name
            .chars()
            .nth(if name.starts_with("On") { 2 } else { 6 })
            .is_some_and(|c| c.is_uppercase())
    {
        return true;
    }
    if name.ends_with("Callback") || name.ends_with("Listener") || name.ends_with("Observer") {
        return true;
    }
    // Lifecycle names.
    matches!(
        name,
        "Setup"
            | "TearDown"
            | "setUp"
            | "tearDown"
            | "__init__"
            | "__new__"
            | "constructor"
            | "componentDidMount"
            | "componentWillUnmount"
            | "useEffect"
    )
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
    fn test_sparse_bitset() {
        let mut bitset = SparseBitSet::new();
        bitset.set(10);
        bitset.set(1_000_000);
        bitset.insert_many([5, 6, 7]);

        assert!(bitset.is_set(10));
        assert!(bitset.is_set(1_000_000));
        assert!(!bitset.is_set(11));
        assert_eq!(bitset.count(), 5);
    }

    #[test]
    fn test_vtable_resolution() {
        let mut registry = VTableRegistry::default();
        registry.register_method("Server", "Start", 3);
        registry.register_method("Worker", "Start", 7);
        registry.register_impl("Runnable", "Worker");

        // Known receiver resolves directly.
        assert_eq!(registry.resolve(Some("Server"), "Start"), vec![3]);
        // Interface receiver resolves through implementations.
        assert_eq!(registry.resolve(Some("Runnable"), "Start"), vec![7]);
        // Unknown receiver falls back to all implementors.
        let mut all = registry.resolve(None, "Start");
        all.sort_unstable();
        assert_eq!(all, vec![3, 7]);
    }

    #[test]
    fn test_two_file_dead_code() {
        let a = extract(
            "package a\n\nfunc unused() {}\n\nfunc used() {}\n",
            "a.go",
        );
        let b = extract("package a\n\nfunc main() {\n\tused()\n}\n", "b.go");

        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let report = analyzer.analyze(&[a, b]);

        let names: Vec<&str> = report
            .dead_functions
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert!(names.contains(&"unused"));
        assert!(!names.contains(&"used"));
        assert!(!names.contains(&"main"));

        let unused = report
            .dead_functions
            .iter()
            .find(|d| d.name == "unused")
            .unwrap();
        assert!(unused.confidence >= 0.90);
        assert!(unused.node_id != 0);
    }

    #[test]
    fn test_exported_symbols_are_entry_points() {
        let a = extract("package a\n\nfunc Exported() {}\n\nfunc hidden() {}\n", "a.go");
        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let report = analyzer.analyze(&[a]);

        let names: Vec<&str> = report
            .dead_functions
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert!(!names.contains(&"Exported"));
        assert!(names.contains(&"hidden"));
    }

    #[test]
    fn test_transitive_reachability() {
        let a = extract(
            "package a\n\nfunc main() {\n\tlevel1()\n}\n\nfunc level1() {\n\tlevel2()\n}\n\nfunc level2() {}\n\nfunc orphan() {}\n",
            "a.go",
        );
        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let report = analyzer.analyze(&[a]);

        let names: Vec<&str> = report
            .dead_functions
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["orphan"]);
    }

    #[test]
    fn test_dynamic_dispatch_keeps_methods_alive() {
        let source = "\
package a

type worker struct{}

func (w *worker) run() {}

func main() {
	w := newWorker()
	w.run()
}

func newWorker() *worker { return &worker{} }
";
        let symbols = extract(source, "a.go");
        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let report = analyzer.analyze(&[symbols]);

        assert!(!report.dead_functions.iter().any(|d| d.name == "run"));
    }

    #[test]
    fn test_vendor_paths_never_reported() {
        let symbols = extract("package v\n\nfunc orphan() {}\n", "vendor/lib/v.go");
        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let report = analyzer.analyze(&[symbols]);
        assert!(report.dead_functions.is_empty());
    }

    #[test]
    fn test_confidence_threshold_filters() {
        let symbols = extract("package a\n\nfunc orphan() {}\n", "a.go");
        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig {
            confidence: 0.99,
            ..Default::default()
        });
        let report = analyzer.analyze(&[symbols]);
        // orphan scores 0.98 (0.95 + 0.03 private), below the 0.99 bar.
        assert!(report.dead_functions.is_empty());
    }

    #[test]
    fn test_coverage_lowers_confidence() {
        let symbols = extract("package a\n\nfunc orphan() {}\n", "a.go");
        let mut covered = CoverageData::default();
        covered
            .covered_lines
            .entry("a.go".to_string())
            .or_default()
            .insert(3);

        let mut analyzer =
            DeadCodeAnalyzer::new(DeadCodeConfig::default()).with_coverage(covered);
        let report = analyzer.analyze(&[symbols]);
        let orphan = report.dead_functions.iter().find(|d| d.name == "orphan").unwrap();
        // 0.95 + 0.03 - 0.40 = 0.58.
        assert!((orphan.confidence - 0.58).abs() < 1e-6);
    }

    #[test]
    fn test_usage_fallback_mode() {
        let a = extract("package a\n\nfunc unused() {}\n\nfunc used() {}\n", "a.go");
        let b = extract("package b\n\nfunc caller() {\n\tused()\n}\n", "b.go");

        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig {
            use_reference_graph: false,
            ..Default::default()
        });
        let report = analyzer.analyze(&[a, b]);

        let names: Vec<&str> = report
            .dead_functions
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert!(names.contains(&"unused"));
        assert!(!names.contains(&"used"));
    }

    #[test]
    fn test_items_ordered_and_ids_dense() {
        let a = extract("package a\n\nfunc zeta() {}\n\nfunc alpha() {}\n", "z.go");
        let b = extract("package b\n\nfunc beta() {}\n", "a.go");
        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let report = analyzer.analyze(&[a, b]);

        let keys: Vec<(&str, u32)> = report
            .dead_functions
            .iter()
            .map(|d| (d.file.as_str(), d.start_line))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        for item in report.iter_items() {
            assert!(item.node_id >= 1);
            assert!(item.confidence >= 0.0 && item.confidence <= 1.0);
            assert!(item.end_line >= item.start_line);
            assert!(item.start_line >= 1);
        }
    }

    #[test]
    fn test_unreachable_blocks_surface_in_report() {
        let symbols = extract(
            "package a\n\nfunc main() {\n\treturn\n\thelper()\n}\n\nfunc helper() {}\n",
            "a.go",
        );
        let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let report = analyzer.analyze(&[symbols]);

        assert_eq!(report.unreachable_code.len(), 1);
        assert_eq!(report.unreachable_code[0].start_line, 5);
        assert_eq!(report.summary.unreachable_blocks, 1);
    }

    #[test]
    fn test_reachability_monotone_under_added_entries() {
        // Adding entry points never shrinks the reachable set.
        let a = extract(
            "package a\n\nfunc one() {}\n\nfunc two() {\n\tone()\n}\n",
            "a.go",
        );
        let mut base = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let base_report = base.analyze(std::slice::from_ref(&a));
        let base_dead = base_report.summary.total_items;

        let b = extract("package a\n\nfunc main() {\n\ttwo()\n}\n", "b.go");
        let mut extended = DeadCodeAnalyzer::new(DeadCodeConfig::default());
        let extended_report = extended.analyze(&[a, b]);
        assert!(extended_report.summary.total_items <= base_dead);
    }
}
