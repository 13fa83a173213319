//! Technical-debt gradient calculation.
//!
//! Per-file heuristic scored against component budgets: structural
//! complexity 20, semantic complexity 15, duplication 15, coupling 15,
//! documentation 5, consistency 10. Penalties attribute to issue ids and
//! coalesce so a repeated finding is charged once; the budget total
//! normalizes to a 0-100 score with a letter grade.

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::score::Grade;
use crate::models::syntax::Language;
use crate::models::tdg::{TdgComponent, TdgHotspot, TdgIssue, TdgReport, TdgScore, TdgSummary};

#[derive(Debug, Clone)]
pub struct TdgConfig {
    /// Nesting deeper than this is penalized.
    pub max_nesting: usize,
    /// Line-duplication ratio above this is penalized.
    pub duplication_threshold: f64,
}

impl Default for TdgConfig {
    fn default() -> Self {
        Self {
            max_nesting: 5,
            duplication_threshold: 0.1,
        }
    }
}

const STRUCTURAL_BUDGET: f64 = 20.0;
const SEMANTIC_BUDGET: f64 = 15.0;
const DUPLICATION_BUDGET: f64 = 15.0;
const COUPLING_BUDGET: f64 = 15.0;
const DOCUMENTATION_BUDGET: f64 = 5.0;
const CONSISTENCY_BUDGET: f64 = 10.0;
const TOTAL_BUDGET: f64 = STRUCTURAL_BUDGET
    + SEMANTIC_BUDGET
    + DUPLICATION_BUDGET
    + COUPLING_BUDGET
    + DOCUMENTATION_BUDGET
    + CONSISTENCY_BUDGET;

pub struct TdgCalculator {
    config: TdgConfig,
    cache: Arc<DashMap<PathBuf, TdgScore>>,
}

impl Default for TdgCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl TdgCalculator {
    pub fn new() -> Self {
        Self::with_config(TdgConfig::default())
    }

    pub fn with_config(config: TdgConfig) -> Self {
        Self {
            config,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Score one file from its raw content.
    pub fn analyze_source(&self, path: &Path, source: &str) -> TdgScore {
        if let Some(cached) = self.cache.get(&path.to_path_buf()) {
            return cached.clone();
        }

        let language = Language::from_path(path);
        let mut issues: Vec<TdgIssue> = Vec::new();
        let mut record = |issue_id: &str, description: String, penalty: f64| {
            issues.push(TdgIssue {
                issue_id: issue_id.to_string(),
                description,
                penalty,
            });
        };

        // Structural: estimated cyclomatic over the whole file.
        let cyclomatic = estimate_cyclomatic(source);
        let mut structural_penalty = 0.0;
        if cyclomatic > 20 {
            structural_penalty = (((cyclomatic - 20) as f64) * 0.5).min(15.0);
            record(
                "high-cyclomatic",
                format!("estimated cyclomatic complexity {cyclomatic} exceeds 20"),
                structural_penalty,
            );
        }
        let defects = critical_defects(source, language);
        if defects > 0 {
            let penalty = (defects as f64 * 0.5).min(5.0);
            structural_penalty += penalty;
            record(
                "panic-prone",
                format!("{defects} panic-prone call sites outside test code"),
                penalty,
            );
        }

        // Semantic: maximum nesting depth.
        let nesting = estimate_max_nesting(source);
        let mut semantic_penalty = 0.0;
        if nesting > self.config.max_nesting {
            semantic_penalty = ((nesting - self.config.max_nesting) as f64).min(10.0);
            record(
                "deep-nesting",
                format!("nesting depth {nesting} exceeds {}", self.config.max_nesting),
                semantic_penalty,
            );
        }

        // Duplication: repeated significant lines.
        let duplication = duplication_ratio(source);
        let mut duplication_penalty = 0.0;
        if duplication > self.config.duplication_threshold {
            duplication_penalty = (duplication * 20.0).min(20.0);
            record(
                "duplicated-lines",
                format!("{:.0}% of significant lines are duplicates", duplication * 100.0),
                duplication_penalty,
            );
        }

        // Coupling: import count.
        let imports = count_imports(source);
        let mut coupling_penalty = 0.0;
        if imports > 20 {
            coupling_penalty = ((imports - 20) as f64 * 0.2).min(10.0);
            record(
                "import-fanout",
                format!("{imports} import statements"),
                coupling_penalty,
            );
        }

        // Documentation: linear credit up to 10% doc lines.
        let doc_ratio = doc_line_ratio(source);
        let documentation_score = (doc_ratio / 0.1).min(1.0) * DOCUMENTATION_BUDGET;

        // Consistency: indentation style majority.
        let consistency = indentation_consistency(source);
        let consistency_score = consistency * CONSISTENCY_BUDGET;
        if consistency < 0.9 {
            record(
                "mixed-indentation",
                format!("indentation is {:.0}% consistent", consistency * 100.0),
                CONSISTENCY_BUDGET - consistency_score,
            );
        }

        let components = vec![
            component("structural_complexity", STRUCTURAL_BUDGET, structural_penalty),
            component("semantic_complexity", SEMANTIC_BUDGET, semantic_penalty),
            component("duplication", DUPLICATION_BUDGET, duplication_penalty),
            component("coupling", COUPLING_BUDGET, coupling_penalty),
            TdgComponent {
                name: "documentation".to_string(),
                budget: DOCUMENTATION_BUDGET,
                score: documentation_score,
            },
            TdgComponent {
                name: "consistency".to_string(),
                budget: CONSISTENCY_BUDGET,
                score: consistency_score,
            },
        ];

        let raw: f64 = components.iter().map(|c| c.score).sum();
        let value = (raw / TOTAL_BUDGET * 100.0).clamp(0.0, 100.0);

        let score = TdgScore {
            path: path.to_string_lossy().to_string(),
            value,
            grade: Grade::from_score(value),
            components,
            issues: coalesce(issues),
        };
        self.cache.insert(path.to_path_buf(), score.clone());
        score
    }

    /// Score a batch and summarize.
    pub fn analyze_files(&self, files: &[(PathBuf, String)]) -> TdgReport {
        let mut scores: Vec<TdgScore> = files
            .iter()
            .map(|(path, source)| self.analyze_source(path, source))
            .collect();
        scores.sort_by(|a, b| {
            a.value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let values: Vec<f64> = scores.iter().map(|s| s.value).collect();
        let average = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        let p95 = if values.is_empty() {
            0.0
        } else {
            values[(values.len() * 95 / 100).min(values.len() - 1)]
        };
        let critical_files = scores
            .iter()
            .filter(|s| matches!(s.grade, Grade::D | Grade::F))
            .count();

        let hotspots: Vec<TdgHotspot> = scores
            .iter()
            .take(10)
            .filter(|s| s.value < 70.0)
            .map(|s| TdgHotspot {
                path: s.path.clone(),
                value: s.value,
                primary_issue: s
                    .issues
                    .iter()
                    .max_by(|a, b| {
                        a.penalty
                            .partial_cmp(&b.penalty)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|i| i.issue_id.clone())
                    .unwrap_or_else(|| "none".to_string()),
            })
            .collect();

        TdgReport {
            summary: TdgSummary {
                total_files: scores.len(),
                average,
                p95,
                critical_files,
                hotspots,
            },
            files: scores,
        }
    }
}

fn component(name: &str, budget: f64, penalty: f64) -> TdgComponent {
    TdgComponent {
        name: name.to_string(),
        budget,
        score: (budget - penalty).clamp(0.0, budget),
    }
}

/// Duplicate issue ids coalesce so one finding is never double-charged.
fn coalesce(issues: Vec<TdgIssue>) -> Vec<TdgIssue> {
    let mut merged: Vec<TdgIssue> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    for issue in issues {
        match index.get(&issue.issue_id) {
            Some(&i) => {
                merged[i].penalty = merged[i].penalty.max(issue.penalty);
            }
            None => {
                index.insert(issue.issue_id.clone(), merged.len());
                merged.push(issue);
            }
        }
    }
    merged
}

/// Line-based cyclomatic estimate: decision keywords weighted by depth.
fn estimate_cyclomatic(source: &str) -> usize {
    const KEYWORDS: &[&str] = &[
        "if ", "else if ", "elif ", "while ", "for ", "case ", "match ", "catch ", "except ",
        "when ", "rescue ",
    ];
    source
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            KEYWORDS
                .iter()
                .filter(|k| trimmed.starts_with(**k) || trimmed.contains(&format!(" {}", **k)))
                .count()
        })
        .sum()
}

/// Brace/indentation depth estimate.
fn estimate_max_nesting(source: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    for line in source.lines() {
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    max = max.max(depth);
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }
    if max > 0 {
        return max;
    }
    // Indentation fallback for brace-less languages.
    source
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let spaces = l.len() - l.trim_start().len();
            spaces / 4
        })
        .max()
        .unwrap_or(0)
}

fn duplication_ratio(source: &str) -> f64 {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    let mut total = 0usize;
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.len() <= 10 || trimmed.starts_with("//") || trimmed.starts_with('#') {
            continue;
        }
        total += 1;
        *counts.entry(trimmed).or_insert(0) += 1;
    }
    if total == 0 {
        return 0.0;
    }
    let duplicated: usize = counts.values().filter(|&&c| c > 1).map(|&c| c - 1).sum();
    duplicated as f64 / total as f64
}

fn count_imports(source: &str) -> usize {
    source
        .lines()
        .map(str::trim_start)
        .filter(|line| {
            line.starts_with("use ")
                || line.starts_with("import ")
                || line.starts_with("from ")
                || line.starts_with("#include")
                || line.starts_with("require(")
                || line.starts_with("using ")
        })
        .count()
}

fn doc_line_ratio(source: &str) -> f64 {
    let mut doc = 0usize;
    let mut total = 0usize;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        total += 1;
        if trimmed.starts_with("///")
            || trimmed.starts_with("//!")
            || trimmed.starts_with("//")
            || trimmed.starts_with('#')
            || trimmed.starts_with("/*")
            || trimmed.starts_with('*')
            || trimmed.starts_with("\"\"\"")
        {
            doc += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        doc as f64 / total as f64
    }
}

/// Fraction of indented lines following the majority style.
fn indentation_consistency(source: &str) -> f64 {
    let mut tabs = 0usize;
    let mut spaces = 0usize;
    for line in source.lines() {
        if line.starts_with('\t') {
            tabs += 1;
        } else if line.starts_with(' ') {
            spaces += 1;
        }
    }
    let total = tabs + spaces;
    if total == 0 {
        1.0
    } else {
        tabs.max(spaces) as f64 / total as f64
    }
}

/// Panic-prone call sites outside test code.
fn critical_defects(source: &str, language: Language) -> usize {
    let mut in_test_block = false;
    let mut depth = 0usize;
    let mut count = 0usize;

    for line in source.lines() {
        let trimmed = line.trim();
        if language == Language::Rust {
            if trimmed.starts_with("#[cfg(test)]") {
                in_test_block = true;
                depth = 0;
            } else if in_test_block {
                depth += trimmed.matches('{').count();
                let closes = trimmed.matches('}').count();
                let before = depth;
                depth = depth.saturating_sub(closes);
                if depth == 0 && closes > 0 && before > 0 {
                    in_test_block = false;
                }
                continue;
            }
        }

        match language {
            Language::Rust => {
                count += trimmed.matches(".unwrap()").count();
                count += trimmed.matches("panic!(").count();
            }
            Language::Go => {
                count += trimmed.matches("panic(").count();
            }
            _ => {}
        }
    }
    count
}
