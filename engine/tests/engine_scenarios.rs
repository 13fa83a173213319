//! End-to-end scenarios over the public analyzer surface.

use std::io::Write;
use std::path::PathBuf;

use omen::models::config::{DeadCodeConfig, SatdConfig};
use omen::models::dag::{DependencyGraph, GraphEdgeType, GraphNodeType};
use omen::services::complexity::ComplexityAnalyzer;
use omen::services::dead_code_analyzer::DeadCodeAnalyzer;
use omen::services::file_processor::{process_files, FileProcessorOptions};
use omen::services::graph_metrics::GraphMetricsAnalyzer;
use omen::services::parser::SourceParser;
use omen::services::satd_detector::{SatdDetector, Severity};
use omen::services::symbol_table::SymbolExtractor;
use omen::services::vcs::GitRepository;
use omen::utils::cancel::CancellationToken;

fn parse(source: &str, name: &str) -> omen::models::syntax::ParsedFile {
    let mut parser = SourceParser::new();
    let path = PathBuf::from(name);
    let language = SourceParser::language_of(&path);
    parser
        .parse_source(&path, source.to_string(), language)
        .unwrap()
}

#[test]
fn scenario_simple_go_function() {
    let parsed = parse("package main\n\nfunc simple() int { return 42 }\n", "simple.go");
    let file = ComplexityAnalyzer::new().analyze_file(&parsed);
    let report = ComplexityAnalyzer::new().aggregate(vec![file]);

    assert_eq!(report.summary.total_functions, 1);
    let function = &report.files[0].functions[0];
    assert_eq!(function.name, "simple");
    assert_eq!(function.cyclomatic, 1);
    assert_eq!(function.cognitive, 0);
    assert_eq!(function.max_nesting, 0);
}

#[test]
fn scenario_nested_go_ifs() {
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
    let parsed = parse(source, "deep.go");
    let file = ComplexityAnalyzer::new().analyze_file(&parsed);
    let function = &file.functions[0];

    assert_eq!(function.cyclomatic, 5);
    assert!(function.cognitive >= 10);
    assert_eq!(function.max_nesting, 8);
}

#[test]
fn scenario_two_file_dead_code() {
    let a = SymbolExtractor::extract(&parse(
        "package app\n\nfunc unused() {}\n\nfunc used() {}\n",
        "a.go",
    ));
    let b = SymbolExtractor::extract(&parse(
        "package app\n\nfunc main() {\n\tused()\n}\n",
        "b.go",
    ));

    let mut analyzer = DeadCodeAnalyzer::new(DeadCodeConfig::default());
    let report = analyzer.analyze(&[a, b]);

    let unused = report
        .dead_functions
        .iter()
        .find(|d| d.name == "unused")
        .expect("unused is reported dead");
    assert!(unused.confidence >= 0.90);
    assert!(!report.dead_functions.iter().any(|d| d.name == "used"));
}

#[test]
fn scenario_satd_mix() {
    let detector = SatdDetector::new(SatdConfig::default());
    let items = detector.extract_from_content(
        "// TODO: x\n// FIXME: y\n// HACK: z\n",
        &PathBuf::from("mix.go"),
        &[],
    );

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].marker, "TODO");
    assert_eq!(items[0].severity, Severity::Low);
    assert_eq!(items[1].marker, "FIXME");
    assert_eq!(items[1].severity, Severity::High);
    assert_eq!(items[2].marker, "HACK");
    assert_eq!(items[2].severity, Severity::Medium);

    let hashes: std::collections::BTreeSet<&str> =
        items.iter().map(|i| i.context_hash.as_str()).collect();
    assert_eq!(hashes.len(), 3);
}

#[test]
fn scenario_change_risk_ordering() {
    use omen::services::change_risk::ChangeRiskAnalyzer;
    use omen::services::vcs::{CommitRecord, FileStat, InMemoryRepository};

    let commit = |hash: &str, message: &str, age: i64, stats: Vec<(&str, usize, usize)>| {
        CommitRecord {
            hash: hash.to_string(),
            author_name: "dev".to_string(),
            author_email: "dev@example.com".to_string(),
            timestamp: chrono::Utc::now() - chrono::Duration::days(age),
            message: message.to_string(),
            parent_count: 1,
            stats: stats
                .into_iter()
                .map(|(path, additions, deletions)| FileStat {
                    path: path.to_string(),
                    additions,
                    deletions,
                })
                .collect(),
        }
    };

    let repo = InMemoryRepository::new(vec![
        commit(
            "refactor",
            "rework storage engine",
            1,
            vec![("store.go", 320, 180), ("index.go", 90, 60), ("wal.go", 40, 10)],
        ),
        commit("docs", "docs: fix typo in readme", 2, vec![("README.md", 1, 1)]),
    ]);

    let report = ChangeRiskAnalyzer::new()
        .analyze(&repo, 30, &CancellationToken::new())
        .unwrap();

    let refactor = report.commits.iter().find(|c| c.hash == "refactor").unwrap();
    let docs = report.commits.iter().find(|c| c.hash == "docs").unwrap();

    assert!((docs.score - 0.05).abs() < 1e-9, "automated commit gets the flat score");
    assert!(refactor.score > docs.score);
}

#[test]
fn scenario_graph_cycle_detection() {
    let mut graph = DependencyGraph::new();
    for name in ["A", "B", "C"] {
        graph.add_node(
            name.to_string(),
            GraphNodeType::Function,
            "cycle.go".to_string(),
            1,
        );
    }
    graph.add_edge(0, 1, GraphEdgeType::Call);
    graph.add_edge(1, 2, GraphEdgeType::Call);
    graph.add_edge(2, 0, GraphEdgeType::Call);

    let report = GraphMetricsAnalyzer::compute(&graph);

    assert!(report.summary.is_cyclic);
    assert_eq!(report.summary.cycle_count, 1);
    assert_eq!(report.summary.strongly_connected_components, 1);
    assert_eq!(report.cycles[0].len(), 3);
    let mut members = report.cycle_nodes.clone();
    members.sort();
    assert_eq!(members, vec!["A", "B", "C"]);
}

#[test]
fn boundary_empty_file_list() {
    let outcome = process_files(&[], &FileProcessorOptions::default(), |_| Ok(()));
    assert!(outcome.results.is_empty());
    assert!(!outcome.cancelled);
}

#[test]
fn boundary_non_git_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = GitRepository::open(dir.path()).unwrap_err();
    assert_eq!(err.kind(), "no-git-repository");
}

#[test]
fn boundary_cancelled_before_work() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("a.go");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"package a\n").unwrap();

    let options = FileProcessorOptions::default();
    options.cancel.cancel();
    let outcome = process_files(&[path], &options, |_| Ok(()));

    assert!(outcome.cancelled);
    assert_eq!(outcome.results[0].as_ref().unwrap_err().kind(), "cancelled");
}

#[test]
fn boundary_oversized_file_skipped() {
    let dir = tempfile::TempDir::new().unwrap();
    let big = dir.path().join("big.go");
    std::fs::write(&big, format!("package big\n// {}\n", "x".repeat(2048))).unwrap();
    let small = dir.path().join("small.go");
    std::fs::write(&small, "package small\n").unwrap();

    let options = FileProcessorOptions {
        max_file_size: 128,
        ..Default::default()
    };
    let outcome = process_files(&[big, small], &options, |parsed| {
        Ok(parsed.language)
    });

    assert_eq!(outcome.results[0].as_ref().unwrap_err().kind(), "file-too-large");
    assert!(outcome.results[1].is_ok());
}

#[test]
fn same_inputs_same_report_modulo_node_ids() {
    let source_a = "package app\n\nfunc orphan() {}\n\nfunc keep() {}\n";
    let source_b = "package app\n\nfunc main() {\n\tkeep()\n}\n";

    let run = || {
        let a = SymbolExtractor::extract(&parse(source_a, "a.go"));
        let b = SymbolExtractor::extract(&parse(source_b, "b.go"));
        DeadCodeAnalyzer::new(DeadCodeConfig::default()).analyze(&[a, b])
    };

    let first = run();
    let second = run();

    let strip = |report: &omen::models::dead_code::DeadCodeReport| {
        report
            .iter_items()
            .map(|i| {
                (
                    i.name.clone(),
                    i.file.clone(),
                    i.start_line,
                    i.end_line,
                    i.confidence.to_bits(),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&first), strip(&second));
}
