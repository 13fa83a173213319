//! File-level defect probability and hotspot ranking.
//!
//! Defect probability is a weighted ensemble over churn, complexity,
//! duplication, and coupling, normalized through empirical CDFs and
//! calibrated with a sigmoid. Hotspots rank files by the multiplicative
//! churn x complexity product: change-often times hard-to-change.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct DefectWeights {
    pub churn: f32,
    pub complexity: f32,
    pub duplication: f32,
    pub coupling: f32,
}

impl Default for DefectWeights {
    fn default() -> Self {
        Self {
            churn: 0.35,
            complexity: 0.30,
            duplication: 0.25,
            coupling: 0.10,
        }
    }
}

/// Input metrics for one file.
#[derive(Debug, Clone)]
pub struct FileDefectInput {
    pub path: String,
    /// Normalized churn score in [0, 1].
    pub churn_score: f32,
    /// Peak cyclomatic complexity of the file's functions.
    pub complexity: f32,
    /// Duplicated-line ratio in [0, 1].
    pub duplicate_ratio: f32,
    /// Incoming dependency count.
    pub afferent_coupling: f32,
    pub lines_of_code: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectRiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectScore {
    pub path: String,
    /// Probability in [0, 1].
    pub probability: f32,
    pub confidence: f32,
    pub risk_level: DefectRiskLevel,
    pub contributing_factors: Vec<(String, f32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub path: String,
    pub churn_score: f32,
    pub complexity_score: f32,
    /// Multiplicative churn x complexity, in [0, 1].
    pub hotspot_score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefectReport {
    pub files: Vec<DefectScore>,
    pub hotspots: Vec<Hotspot>,
    pub avg_probability: f32,
}

pub struct DefectAnalyzer {
    weights: DefectWeights,
}

impl Default for DefectAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DefectAnalyzer {
    pub fn new() -> Self {
        Self {
            weights: DefectWeights::default(),
        }
    }

    pub fn with_weights(weights: DefectWeights) -> Self {
        Self { weights }
    }

    pub fn score(&self, input: &FileDefectInput) -> DefectScore {
        let churn = normalize_churn(input.churn_score);
        let complexity = normalize_complexity(input.complexity);
        let duplication = input.duplicate_ratio.clamp(0.0, 1.0);
        let coupling = normalize_coupling(input.afferent_coupling);

        let raw = self.weights.churn * churn
            + self.weights.complexity * complexity
            + self.weights.duplication * duplication
            + self.weights.coupling * coupling;

        // Sigmoid calibration around the 0.5 midpoint.
        let probability = 1.0 / (1.0 + (-10.0 * (raw - 0.5)).exp());

        let risk_level = match probability {
            p if p >= 0.7 => DefectRiskLevel::High,
            p if p >= 0.3 => DefectRiskLevel::Medium,
            _ => DefectRiskLevel::Low,
        };

        DefectScore {
            path: input.path.clone(),
            probability,
            confidence: self.confidence(input),
            risk_level,
            contributing_factors: vec![
                ("churn".to_string(), churn * self.weights.churn),
                ("complexity".to_string(), complexity * self.weights.complexity),
                ("duplication".to_string(), duplication * self.weights.duplication),
                ("coupling".to_string(), coupling * self.weights.coupling),
            ],
        }
    }

    fn confidence(&self, input: &FileDefectInput) -> f32 {
        let mut confidence: f32 = 1.0;
        if input.lines_of_code < 10 {
            confidence *= 0.5;
        } else if input.lines_of_code < 50 {
            confidence *= 0.8;
        }
        if input.afferent_coupling == 0.0 {
            confidence *= 0.9;
        }
        if input.churn_score == 0.0 {
            confidence *= 0.85;
        }
        confidence.clamp(0.0, 1.0)
    }

    /// Score a batch and derive the hotspot ranking.
    pub fn analyze(&self, inputs: &[FileDefectInput]) -> DefectReport {
        let mut files: Vec<DefectScore> = inputs.iter().map(|i| self.score(i)).collect();
        files.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });

        let max_complexity = inputs
            .iter()
            .map(|i| i.complexity)
            .fold(1.0f32, f32::max);

        let mut hotspots: Vec<Hotspot> = inputs
            .iter()
            .map(|i| {
                let complexity_score = (i.complexity / max_complexity).clamp(0.0, 1.0);
                Hotspot {
                    path: i.path.clone(),
                    churn_score: i.churn_score,
                    complexity_score,
                    hotspot_score: i.churn_score * complexity_score,
                }
            })
            .filter(|h| h.hotspot_score > 0.0)
            .collect();
        hotspots.sort_by(|a, b| {
            b.hotspot_score
                .partial_cmp(&a.hotspot_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        hotspots.truncate(10);

        let avg_probability = if files.is_empty() {
            0.0
        } else {
            files.iter().map(|f| f.probability).sum::<f32>() / files.len() as f32
        };

        DefectReport {
            files,
            hotspots,
            avg_probability,
        }
    }
}

/// Empirical CDF from OSS project churn distributions.
fn normalize_churn(raw: f32) -> f32 {
    const PERCENTILES: [(f32, f32); 10] = [
        (0.0, 0.0),
        (0.1, 0.05),
        (0.2, 0.15),
        (0.3, 0.30),
        (0.4, 0.50),
        (0.5, 0.70),
        (0.6, 0.85),
        (0.7, 0.93),
        (0.8, 0.97),
        (1.0, 1.0),
    ];
    interpolate_cdf(&PERCENTILES, raw)
}

/// Empirical CDF for cyclomatic complexity.
fn normalize_complexity(raw: f32) -> f32 {
    const PERCENTILES: [(f32, f32); 10] = [
        (1.0, 0.1),
        (2.0, 0.2),
        (3.0, 0.3),
        (5.0, 0.5),
        (7.0, 0.7),
        (10.0, 0.8),
        (15.0, 0.9),
        (20.0, 0.95),
        (30.0, 0.98),
        (50.0, 1.0),
    ];
    interpolate_cdf(&PERCENTILES, raw)
}

/// Empirical CDF for afferent coupling.
fn normalize_coupling(raw: f32) -> f32 {
    const PERCENTILES: [(f32, f32); 8] = [
        (0.0, 0.1),
        (1.0, 0.3),
        (2.0, 0.5),
        (3.0, 0.7),
        (5.0, 0.8),
        (8.0, 0.9),
        (12.0, 0.95),
        (20.0, 1.0),
    ];
    interpolate_cdf(&PERCENTILES, raw)
}

fn interpolate_cdf(percentiles: &[(f32, f32)], value: f32) -> f32 {
    if value <= percentiles[0].0 {
        return percentiles[0].1;
    }
    if value >= percentiles[percentiles.len() - 1].0 {
        return percentiles[percentiles.len() - 1].1;
    }
    for window in percentiles.windows(2) {
        let (x1, y1) = window[0];
        let (x2, y2) = window[1];
        if value >= x1 && value <= x2 {
            let t = (value - x1) / (x2 - x1);
            return y1 + t * (y2 - y1);
        }
    }
    0.0
}
