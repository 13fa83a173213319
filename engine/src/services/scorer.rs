//! Composite health scoring.
//!
//! Combines the six component subscores (each pre-normalized to [0, 100])
//! with the configured weights, maps the rounded sum to a letter grade, and
//! evaluates per-component threshold gates. Failing a gate is a non-error
//! "did not pass" with diagnostics, never a hard error.

use std::collections::BTreeMap;
use tracing::debug;

use crate::models::config::{ScoreThresholds, ScoreWeights};
use crate::models::error::EngineError;
use crate::models::score::{Grade, HealthScore, ScoreComponents, ThresholdCheck};

#[derive(Debug)]
pub struct CompositeScorer {
    weights: ScoreWeights,
    thresholds: ScoreThresholds,
}

impl CompositeScorer {
    /// Construction validates the weights; an invalid sum fails loading.
    pub fn new(weights: ScoreWeights, thresholds: ScoreThresholds) -> Result<Self, EngineError> {
        weights.validate()?;
        Ok(Self {
            weights,
            thresholds,
        })
    }

    pub fn score(&self, components: ScoreComponents, files_analyzed: usize) -> HealthScore {
        let weighted = self.weights.complexity * components.complexity
            + self.weights.duplication * components.duplication
            + self.weights.defect * components.defect
            + self.weights.debt * components.debt
            + self.weights.coupling * components.coupling
            + self.weights.smells * components.smells;
        let score = weighted.round().clamp(0.0, 100.0) as u32;

        let mut thresholds = BTreeMap::new();
        let mut passed = true;
        let mut gate = |name: &str, actual: f64, required: u32| {
            if required == 0 {
                return;
            }
            let check = ThresholdCheck {
                passed: actual >= required as f64,
                actual,
                required: required as f64,
            };
            passed &= check.passed;
            thresholds.insert(name.to_string(), check);
        };

        gate("score", score as f64, self.thresholds.score);
        gate("complexity", components.complexity, self.thresholds.complexity);
        gate("duplication", components.duplication, self.thresholds.duplication);
        gate("debt", components.debt, self.thresholds.debt);
        gate("coupling", components.coupling, self.thresholds.coupling);
        gate("smells", components.smells, self.thresholds.smells);

        debug!(score, passed, "composite score");
        HealthScore {
            score,
            grade: Grade::from_score(score as f64),
            components,
            thresholds,
            passed,
            files_analyzed,
            commit: None,
        }
    }
}

/// Average cyclomatic complexity mapped to a [0, 100] subscore; an average
/// of 1 is pristine, 25+ is unmaintainable.
pub fn complexity_subscore(avg_cyclomatic: f64) -> f64 {
    let normalized = ((avg_cyclomatic - 1.0) / 24.0).clamp(0.0, 1.0);
    (1.0 - normalized) * 100.0
}

/// Duplicated-line ratio mapped to a subscore.
pub fn duplication_subscore(project_ratio: f64) -> f64 {
    (1.0 - project_ratio.clamp(0.0, 1.0)) * 100.0
}

/// Average defect probability mapped to a subscore.
pub fn defect_subscore(avg_probability: f64) -> f64 {
    (1.0 - avg_probability.clamp(0.0, 1.0)) * 100.0
}

/// SATD debt density: severity-weighted items per KLOC.
pub fn debt_subscore(weighted_items: f64, total_lines: usize) -> f64 {
    if total_lines == 0 {
        return 100.0;
    }
    let per_kloc = weighted_items * 1000.0 / total_lines as f64;
    // Ten weighted items per KLOC exhausts the score.
    (1.0 - (per_kloc / 10.0).min(1.0)) * 100.0
}

/// Graph density and average degree mapped to a coupling subscore.
pub fn coupling_subscore(avg_degree: f64) -> f64 {
    // An average fan-out beyond 8 reads as heavily coupled.
    let normalized = (avg_degree / 8.0).clamp(0.0, 1.0);
    (1.0 - normalized) * 100.0
}

/// Dead-code share mapped to a smells subscore.
pub fn smells_subscore(dead_items: usize, total_definitions: usize) -> f64 {
    if total_definitions == 0 {
        return 100.0;
    }
    let ratio = (dead_items as f64 / total_definitions as f64).clamp(0.0, 1.0);
    (1.0 - ratio) * 100.0
}
