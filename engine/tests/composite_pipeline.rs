//! Whole-pipeline smoke test: parse a small project, run every analyzer,
//! and feed the composite scorer from their outputs.

use std::path::PathBuf;

use omen::models::config::{DeadCodeConfig, DuplicateConfig, EngineConfig, SatdConfig};
use omen::models::dag::GraphScope;
use omen::services::complexity::ComplexityAnalyzer;
use omen::services::dag_builder::DagBuilder;
use omen::services::dead_code_analyzer::DeadCodeAnalyzer;
use omen::services::defect::{DefectAnalyzer, FileDefectInput};
use omen::services::duplicate_detector::DuplicateDetector;
use omen::services::graph_metrics::GraphMetricsAnalyzer;
use omen::services::parser::SourceParser;
use omen::services::satd_detector::SatdDetector;
use omen::services::scorer::{
    complexity_subscore, coupling_subscore, debt_subscore, defect_subscore,
    duplication_subscore, smells_subscore, CompositeScorer,
};
use omen::services::symbol_table::SymbolExtractor;
use omen::services::tdg_calculator::TdgCalculator;

const MAIN_GO: &str = r#"package main

import "fmt"

func main() {
	result := Process(42)
	fmt.Println(result)
}

func Process(input int) int {
	// TODO: handle negative inputs
	if input > 100 {
		if input > 1000 {
			return input / 2
		}
		return input - 1
	}
	return input + 1
}
"#;

const UTIL_GO: &str = r#"package main

func helper(a, b int) int {
	if a > b && b > 0 {
		return a
	}
	return b
}

func forgotten() int {
	return -1
}
"#;

fn sources() -> Vec<(PathBuf, &'static str)> {
    vec![
        (PathBuf::from("main.go"), MAIN_GO),
        (PathBuf::from("util.go"), UTIL_GO),
    ]
}

#[test]
fn full_pipeline_produces_consistent_score() {
    let mut parser = SourceParser::new();
    let parsed: Vec<_> = sources()
        .into_iter()
        .map(|(path, source)| {
            let language = SourceParser::language_of(&path);
            parser.parse_source(&path, source.to_string(), language).unwrap()
        })
        .collect();

    // Per-file extraction chain over shared trees.
    let complexity_analyzer = ComplexityAnalyzer::new();
    let satd = SatdDetector::new(SatdConfig::default());
    let file_complexities: Vec<_> = parsed
        .iter()
        .map(|p| complexity_analyzer.analyze_file(p))
        .collect();
    let satd_items: Vec<_> = parsed
        .iter()
        .map(|p| satd.extract_from_content(&p.source, &p.path, &[]))
        .collect();
    let symbols: Vec<_> = parsed.iter().map(SymbolExtractor::extract).collect();

    // Aggregation.
    let complexity = complexity_analyzer.aggregate(file_complexities);
    let satd_report = satd.aggregate(satd_items);
    let mut dead_code = DeadCodeAnalyzer::new(DeadCodeConfig::default());
    let dead_report = dead_code.analyze(&symbols);

    let graph = DagBuilder::new(GraphScope::Function).build(&symbols);
    let metrics = GraphMetricsAnalyzer::compute(&graph);

    let duplication = DuplicateDetector::new(DuplicateConfig::default()).analyze(
        &sources()
            .into_iter()
            .map(|(p, s)| (p.to_string_lossy().to_string(), s.to_string()))
            .collect::<Vec<_>>(),
    );

    let tdg = TdgCalculator::new().analyze_files(
        &sources()
            .into_iter()
            .map(|(p, s)| (p, s.to_string()))
            .collect::<Vec<_>>(),
    );

    let defects = DefectAnalyzer::new().analyze(&[
        FileDefectInput {
            path: "main.go".to_string(),
            churn_score: 0.4,
            complexity: complexity.summary.max_cyclomatic as f32,
            duplicate_ratio: *duplication.file_ratios.get("main.go").unwrap_or(&0.0) as f32,
            afferent_coupling: 1.0,
            lines_of_code: MAIN_GO.lines().count(),
        },
        FileDefectInput {
            path: "util.go".to_string(),
            churn_score: 0.1,
            complexity: 3.0,
            duplicate_ratio: *duplication.file_ratios.get("util.go").unwrap_or(&0.0) as f32,
            afferent_coupling: 0.0,
            lines_of_code: UTIL_GO.lines().count(),
        },
    ]);

    // Sanity of the intermediate reports.
    assert_eq!(complexity.summary.total_files, 2);
    assert!(complexity.summary.total_functions >= 4);
    assert_eq!(satd_report.summary.total_items, 1);
    assert!(dead_report
        .dead_functions
        .iter()
        .any(|d| d.name == "forgotten"));
    assert!(metrics.summary.total_nodes >= 4);
    assert!(tdg.summary.total_files == 2);

    // Composite assembly.
    let total_lines: usize = sources().iter().map(|(_, s)| s.lines().count()).sum();
    let weighted_debt: f64 = satd_report
        .items
        .iter()
        .map(|i| i.severity.weight() as f64)
        .sum();
    let total_definitions: usize = symbols.iter().map(|s| s.definitions.len()).sum();

    let config = EngineConfig::default();
    let scorer =
        CompositeScorer::new(config.score.weights, config.score.thresholds).unwrap();
    let components = omen::models::score::ScoreComponents {
        complexity: complexity_subscore(complexity.summary.avg_cyclomatic),
        duplication: duplication_subscore(duplication.project_ratio),
        defect: defect_subscore(defects.avg_probability as f64),
        debt: debt_subscore(weighted_debt, total_lines),
        coupling: coupling_subscore(metrics.summary.avg_degree),
        smells: smells_subscore(dead_report.summary.total_items, total_definitions),
    };
    let health = scorer.score(components, 2);

    assert!(health.score <= 100);
    // A tiny clean-ish project should not grade below C.
    assert!(health.score >= 60, "score was {}", health.score);

    // Idempotence of the scoring layer.
    let again = scorer.score(components, 2);
    assert_eq!(health.score, again.score);
    assert_eq!(health.grade, again.grade);
}
