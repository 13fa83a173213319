//! Function-level complexity analysis.
//!
//! Computes McCabe cyclomatic complexity, SonarSource cognitive complexity,
//! maximum nesting depth, and optional Halstead metrics for every function
//! in a parsed file, then aggregates file and project summaries with
//! percentile statistics.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::models::syntax::{Language, ParsedFile};
use crate::services::language::{
    binary_expression_types, class_types, cognitive_flat_types, cognitive_nesting_types,
    decision_types, function_types, logical_operators, nesting_types,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HalsteadMetrics {
    /// Distinct operators.
    pub n1: usize,
    /// Distinct operands.
    pub n2: usize,
    /// Total operator occurrences.
    pub big_n1: usize,
    /// Total operand occurrences.
    pub big_n2: usize,
    pub vocabulary: usize,
    pub length: usize,
    pub volume: f64,
    pub difficulty: f64,
    pub effort: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionComplexity {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub cyclomatic: u32,
    pub cognitive: u32,
    pub max_nesting: u32,
    pub lines: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halstead: Option<HalsteadMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileComplexity {
    pub path: String,
    pub language: Language,
    pub functions: Vec<FunctionComplexity>,
    pub total_cyclomatic: u64,
    pub total_cognitive: u64,
    pub avg_cyclomatic: f64,
    pub avg_cognitive: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplexitySummary {
    pub total_files: usize,
    pub total_functions: usize,
    pub avg_cyclomatic: f64,
    pub avg_cognitive: f64,
    pub max_cyclomatic: u32,
    pub max_cognitive: u32,
    pub p50_cyclomatic: u32,
    pub p50_cognitive: u32,
    pub p90_cyclomatic: u32,
    pub p90_cognitive: u32,
    pub p95_cyclomatic: u32,
    pub p95_cognitive: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub files: Vec<FileComplexity>,
    pub summary: ComplexitySummary,
}

/// Percentile of a sorted sequence: element at `floor(p * len / 100)`
/// clamped to the last index; 0 for empty input.
pub fn percentile(sorted: &[u32], p: usize) -> u32 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (p * sorted.len() / 100).min(sorted.len() - 1);
    sorted[idx]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityAnalyzer {
    include_halstead: bool,
}

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self {
            include_halstead: false,
        }
    }

    pub fn with_halstead(mut self, include: bool) -> Self {
        self.include_halstead = include;
        self
    }

    /// Compute per-function metrics for one parsed file.
    pub fn analyze_file(&self, parsed: &ParsedFile) -> FileComplexity {
        let language = parsed.language;
        let mut functions = Vec::new();

        collect_functions(parsed.root(), language, &mut |node| {
            functions.push(self.analyze_function(parsed, node));
        });

        let total_cyclomatic: u64 = functions.iter().map(|f| f.cyclomatic as u64).sum();
        let total_cognitive: u64 = functions.iter().map(|f| f.cognitive as u64).sum();
        let count = functions.len().max(1) as f64;

        FileComplexity {
            path: parsed.path.to_string_lossy().to_string(),
            language,
            avg_cyclomatic: if functions.is_empty() {
                0.0
            } else {
                total_cyclomatic as f64 / count
            },
            avg_cognitive: if functions.is_empty() {
                0.0
            } else {
                total_cognitive as f64 / count
            },
            total_cyclomatic,
            total_cognitive,
            functions,
        }
    }

    fn analyze_function(&self, parsed: &ParsedFile, node: Node<'_>) -> FunctionComplexity {
        let language = parsed.language;
        let body = node.child_by_field_name("body").unwrap_or(node);
        let start_line = ParsedFile::start_line(node);
        let end_line = ParsedFile::end_line(node);

        FunctionComplexity {
            name: function_name(parsed, node),
            start_line,
            end_line,
            cyclomatic: cyclomatic(parsed, body, language),
            cognitive: cognitive(parsed, body, language),
            max_nesting: max_nesting(body, language),
            lines: end_line - start_line + 1,
            halstead: self.include_halstead.then(|| halstead(parsed, body)),
        }
    }

    /// Merge per-file results into the project report.
    pub fn aggregate(&self, files: Vec<FileComplexity>) -> ComplexityReport {
        let mut cyclomatic: Vec<u32> = Vec::new();
        let mut cognitive: Vec<u32> = Vec::new();

        for file in &files {
            for function in &file.functions {
                cyclomatic.push(function.cyclomatic);
                cognitive.push(function.cognitive);
            }
        }

        cyclomatic.sort_unstable();
        cognitive.sort_unstable();

        let total_functions = cyclomatic.len();
        let avg = |values: &[u32]| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
            }
        };

        ComplexityReport {
            summary: ComplexitySummary {
                total_files: files.len(),
                total_functions,
                avg_cyclomatic: avg(&cyclomatic),
                avg_cognitive: avg(&cognitive),
                max_cyclomatic: cyclomatic.last().copied().unwrap_or(0),
                max_cognitive: cognitive.last().copied().unwrap_or(0),
                p50_cyclomatic: percentile(&cyclomatic, 50),
                p50_cognitive: percentile(&cognitive, 50),
                p90_cyclomatic: percentile(&cyclomatic, 90),
                p90_cognitive: percentile(&cognitive, 90),
                p95_cyclomatic: percentile(&cyclomatic, 95),
                p95_cognitive: percentile(&cognitive, 95),
            },
            files,
        }
    }
}

/// Visit function nodes, outermost first. Nested functions are visited as
/// their own entries.
fn collect_functions<'a, F>(root: Node<'a>, language: Language, f: &mut F)
where
    F: FnMut(Node<'a>),
{
    let fn_types = function_types(language);
    crate::services::parser::visit_typed(root, &mut |kind, node| {
        if fn_types.contains(&kind) {
            f(node);
        }
        true
    });
}

fn function_name(parsed: &ParsedFile, node: Node<'_>) -> String {
    if let Some(name) = node.child_by_field_name("name") {
        return parsed.node_text(name).to_string();
    }
    // Anonymous functions bound to a variable take the binding's name.
    if let Some(parent) = node.parent() {
        if parent.kind() == "variable_declarator" || parent.kind() == "assignment" {
            if let Some(name) = parent.child_by_field_name("name") {
                return parsed.node_text(name).to_string();
            }
        }
    }
    "<anonymous>".to_string()
}

/// True when the node starts a nested function whose body must not leak
/// into the enclosing function's metrics.
fn is_nested_function(kind: &str, language: Language) -> bool {
    function_types(language).contains(&kind) || class_types(language).contains(&kind)
}

fn has_logical_operator(parsed: &ParsedFile, node: Node<'_>, operators: &[&str]) -> bool {
    if let Some(op) = node.child_by_field_name("operator") {
        return operators.contains(&parsed.node_text(op));
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if !child.is_named() && operators.contains(&parsed.node_text(child)) {
                return true;
            }
        }
    }
    false
}

/// Walk every node below a function body, skipping nested function and
/// class subtrees so their decisions stay out of the enclosing function.
fn walk_function_body<'a, F>(body: Node<'a>, language: Language, f: &mut F)
where
    F: FnMut(&'static str, Node<'a>),
{
    for i in 0..body.child_count() {
        if let Some(child) = body.child(i) {
            walk_body_inner(child, language, f);
        }
    }
}

fn walk_body_inner<'a, F>(node: Node<'a>, language: Language, f: &mut F)
where
    F: FnMut(&'static str, Node<'a>),
{
    if is_nested_function(node.kind(), language) {
        return;
    }
    f(node.kind(), node);
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk_body_inner(child, language, f);
        }
    }
}

/// McCabe: 1 + decision nodes + logical operators in binary expressions.
fn cyclomatic(parsed: &ParsedFile, body: Node<'_>, language: Language) -> u32 {
    let decisions = decision_types(language);
    let binaries = binary_expression_types(language);
    let operators = logical_operators(language);

    let mut count = 1u32;
    walk_function_body(body, language, &mut |kind, node| {
        if decisions.contains(&kind) {
            count += 1;
        } else if binaries.contains(&kind) && has_logical_operator(parsed, node, operators) {
            count += 1;
        }
    });
    count
}

/// SonarSource cognitive complexity.
fn cognitive(parsed: &ParsedFile, body: Node<'_>, language: Language) -> u32 {
    let mut score = 0u32;
    cognitive_walk(parsed, body, language, 0, &mut score);
    score
}

fn cognitive_walk(
    parsed: &ParsedFile,
    node: Node<'_>,
    language: Language,
    depth: u32,
    score: &mut u32,
) {
    let nesting = cognitive_nesting_types(language);
    let flat = cognitive_flat_types(language);
    let binaries = binary_expression_types(language);
    let operators = logical_operators(language);

    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        let kind = child.kind();

        if is_nested_function(kind, language) {
            continue;
        }

        if nesting.contains(&kind) {
            if is_else_if(child) {
                // An `if` that is the body of an `else` reads linearly: +1,
                // no depth increase.
                *score += 1;
                cognitive_walk(parsed, child, language, depth, score);
            } else {
                *score += 1 + depth;
                cognitive_walk(parsed, child, language, depth + 1, score);
            }
        } else if flat.contains(&kind) {
            *score += 1 + depth;
            cognitive_walk(parsed, child, language, depth, score);
        } else if binaries.contains(&kind) && has_logical_operator(parsed, child, operators) {
            *score += 1;
            cognitive_walk(parsed, child, language, depth, score);
        } else {
            cognitive_walk(parsed, child, language, depth, score);
        }
    }
}

fn is_else_if(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    if parent.kind() == "else_clause" {
        return true;
    }
    if let Some(alternative) = parent.child_by_field_name("alternative") {
        return alternative.id() == node.id();
    }
    false
}

/// Deepest chain of nesting-type nodes below the body. Blocks count, so the
/// result reflects brace depth.
fn max_nesting(body: Node<'_>, language: Language) -> u32 {
    let nesting = nesting_types(language);
    let mut max = 0u32;
    nesting_walk(body, language, nesting, 0, &mut max);
    max
}

fn nesting_walk(
    node: Node<'_>,
    language: Language,
    nesting: &[&str],
    depth: u32,
    max: &mut u32,
) {
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if is_nested_function(child.kind(), language) {
            continue;
        }
        let depth_here = if nesting.contains(&child.kind()) {
            depth + 1
        } else {
            depth
        };
        if depth_here > *max {
            *max = depth_here;
        }
        nesting_walk(child, language, nesting, depth_here, max);
    }
}

fn is_operand_kind(kind: &str) -> bool {
    kind.ends_with("identifier")
        || kind.contains("literal")
        || matches!(
            kind,
            "identifier"
                | "number"
                | "integer"
                | "float"
                | "string"
                | "true"
                | "false"
                | "nil"
                | "none"
                | "int_literal"
                | "rune_literal"
        )
}

fn is_delimiter(text: &str) -> bool {
    matches!(text, "(" | ")" | "{" | "}" | "[" | "]" | "," | ";" | ":")
}

fn halstead(parsed: &ParsedFile, body: Node<'_>) -> HalsteadMetrics {
    let mut operators: FxHashMap<String, usize> = FxHashMap::default();
    let mut operands: FxHashMap<String, usize> = FxHashMap::default();

    crate::services::parser::visit_nodes(body, &mut |node| {
        if node.child_count() == 0 {
            let text = parsed.node_text(node);
            if text.is_empty() {
                return true;
            }
            if node.is_named() && is_operand_kind(node.kind()) {
                *operands.entry(text.to_string()).or_insert(0) += 1;
            } else if !node.is_named() && !is_delimiter(text) {
                *operators.entry(text.to_string()).or_insert(0) += 1;
            }
        }
        true
    });

    let n1 = operators.len();
    let n2 = operands.len();
    let big_n1: usize = operators.values().sum();
    let big_n2: usize = operands.values().sum();
    let vocabulary = n1 + n2;
    let length = big_n1 + big_n2;

    let volume = if vocabulary > 0 {
        length as f64 * (vocabulary as f64).log2()
    } else {
        0.0
    };
    let difficulty = if n2 > 0 {
        (n1 as f64 / 2.0) * (big_n2 as f64 / n2 as f64)
    } else {
        0.0
    };

    HalsteadMetrics {
        n1,
        n2,
        big_n1,
        big_n2,
        vocabulary,
        length,
        volume,
        difficulty,
        effort: difficulty * volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parser::SourceParser;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn parse(source: &str, name: &str) -> ParsedFile {
        let mut parser = SourceParser::new();
        let path = PathBuf::from(name);
        let language = SourceParser::language_of(&path);
        parser
            .parse_source(&path, source.to_string(), language)
            .unwrap()
    }

    fn analyze(source: &str, name: &str) -> FileComplexity {
        ComplexityAnalyzer::new().analyze_file(&parse(source, name))
    }

    #[test]
    fn test_simple_go_function() {
        let file = analyze("package main\n\nfunc simple() int { return 42 }\n", "main.go");
        assert_eq!(file.functions.len(), 1);
        let f = &file.functions[0];
        assert_eq!(f.name, "simple");
        assert_eq!(f.cyclomatic, 1);
        assert_eq!(f.cognitive, 0);
        assert_eq!(f.max_nesting, 0);
    }

    #[test]
    fn test_nested_go_ifs() {
        let source = r#"package main

func deep(a, b, c, d int) int {
	if a > 0 {
		if b > 0 {
			if c > 0 {
				if d > 0 {
					return a + b + c + d
				}
			}
		}
	}
	return 0
}
"#;
        let file = analyze(source, "deep.go");
        let f = &file.functions[0];
        assert_eq!(f.cyclomatic, 5);
        assert!(f.cognitive >= 10, "cognitive was {}", f.cognitive);
        assert_eq!(f.max_nesting, 8);
    }

    #[test]
    fn test_logical_operators_count_once_per_expression() {
        let source = "package main\n\nfunc cond(a, b, c bool) bool {\n\tif a && b || c {\n\t\treturn true\n\t}\n\treturn false\n}\n";
        let file = analyze(source, "cond.go");
        // 1 base + 1 if + 2 logical operators.
        assert_eq!(file.functions[0].cyclomatic, 4);
    }

    #[test]
    fn test_else_if_is_flat_in_cognitive() {
        let chained = r#"package main

func pick(a int) int {
	if a == 1 {
		return 1
	} else if a == 2 {
		return 2
	} else if a == 3 {
		return 3
	}
	return 0
}
"#;
        let file = analyze(chained, "pick.go");
        // 1 for the first if, then 1 per else-if: no nesting escalation.
        assert_eq!(file.functions[0].cognitive, 3);
    }

    #[test]
    fn test_python_boolean_operators() {
        let source = "def check(a, b):\n    if a and b:\n        return True\n    return False\n";
        let file = analyze(source, "check.py");
        // 1 base + 1 if + 1 boolean operator.
        assert_eq!(file.functions[0].cyclomatic, 3);
    }

    #[test]
    fn test_rust_match_arms() {
        let source = r#"
fn describe(x: u32) -> &'static str {
    match x {
        0 => "zero",
        1 => "one",
        _ => "many",
    }
}
"#;
        let file = analyze(source, "describe.rs");
        // 1 base + match + 3 arms.
        assert_eq!(file.functions[0].cyclomatic, 5);
    }

    #[test]
    fn test_nested_function_does_not_leak() {
        let source = r#"
def outer():
    def inner(x):
        if x:
            return 1
        return 0
    return inner(2)
"#;
        let file = analyze(source, "nested.py");
        let outer = file.functions.iter().find(|f| f.name == "outer").unwrap();
        let inner = file.functions.iter().find(|f| f.name == "inner").unwrap();
        assert_eq!(outer.cyclomatic, 1);
        assert_eq!(inner.cyclomatic, 2);
    }

    #[test]
    fn test_halstead_basic() {
        let source = "package main\n\nfunc add(a, b int) int { return a + b }\n";
        let parsed = parse(source, "add.go");
        let file = ComplexityAnalyzer::new()
            .with_halstead(true)
            .analyze_file(&parsed);
        let h = file.functions[0].halstead.as_ref().unwrap();
        assert!(h.n2 >= 2); // a, b
        assert!(h.big_n1 >= 1); // +
        assert_eq!(h.vocabulary, h.n1 + h.n2);
        assert_eq!(h.length, h.big_n1 + h.big_n2);
        assert!(h.volume > 0.0);
    }

    #[test]
    fn test_percentile_contract() {
        assert_eq!(percentile(&[], 50), 0);
        assert_eq!(percentile(&[7], 50), 7);
        let sorted = [1, 2, 3, 4, 10];
        assert_eq!(percentile(&sorted, 100), 10);
        assert_eq!(percentile(&sorted, 0), 1);
        // floor(50 * 5 / 100) = 2.
        assert_eq!(percentile(&sorted, 50), 3);
    }

    #[test]
    fn test_aggregate_summary() {
        let analyzer = ComplexityAnalyzer::new();
        let a = analyze(
            "package a\n\nfunc one() int { return 1 }\n",
            "a.go",
        );
        let b = analyze(
            "package b\n\nfunc two(x int) int {\n\tif x > 0 {\n\t\treturn x\n\t}\n\treturn 0\n}\n",
            "b.go",
        );
        let report = analyzer.aggregate(vec![a, b]);

        assert_eq!(report.summary.total_files, 2);
        assert_eq!(report.summary.total_functions, 2);
        assert_eq!(report.summary.max_cyclomatic, 2);
        assert!((report.summary.avg_cyclomatic - 1.5).abs() < 1e-9);
    }

    proptest::proptest! {
        #[test]
        fn prop_percentile_within_bounds(mut values in proptest::collection::vec(0u32..100, 1..50), p in 0usize..=100) {
            values.sort_unstable();
            let result = percentile(&values, p);
            proptest::prop_assert!(result >= values[0]);
            proptest::prop_assert!(result <= *values.last().unwrap());
        }
    }
}
