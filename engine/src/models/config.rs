//! Engine configuration.
//!
//! Keys mirror the TOML surface:
//! `analysis.churn_days`, `analysis.max_file_size`, `score.weights.*`,
//! `score.thresholds.*`, and per-analyzer toggle tables. Score weights must
//! sum to 1.0 within a 0.01 tolerance or loading fails.

use serde::{Deserialize, Serialize};

use crate::models::dag::GraphScope;
use crate::models::error::EngineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analysis: AnalysisSettings,
    pub score: ScoreConfig,
    pub satd: SatdConfig,
    pub dead_code: DeadCodeConfig,
    pub duplicates: DuplicateConfig,
    pub graph: GraphConfig,
    pub vcs: VcsAnalysisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            score: ScoreConfig::default(),
            satd: SatdConfig::default(),
            dead_code: DeadCodeConfig::default(),
            duplicates: DuplicateConfig::default(),
            graph: GraphConfig::default(),
            vcs: VcsAnalysisConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from TOML and validate. Invalid weights fail loading.
    pub fn from_toml_str(content: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| EngineError::Config {
            key: "config".to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.score.weights.validate()?;
        if self.vcs.days == 0 {
            return Err(EngineError::InvalidPeriod { days: 0 });
        }
        if self.analysis.churn_days == 0 {
            return Err(EngineError::InvalidPeriod { days: 0 });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// VCS window for churn-derived metrics.
    pub churn_days: u32,
    /// Per-file byte limit; 0 means unlimited.
    pub max_file_size: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            churn_days: 30,
            max_file_size: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub weights: ScoreWeights,
    pub thresholds: ScoreThresholds,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub complexity: f64,
    pub duplication: f64,
    pub defect: f64,
    pub debt: f64,
    pub coupling: f64,
    pub smells: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            complexity: 0.25,
            defect: 0.25,
            duplication: 0.20,
            debt: 0.15,
            coupling: 0.10,
            smells: 0.05,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.complexity + self.duplication + self.defect + self.debt + self.coupling + self.smells
    }

    /// Weights must sum to 1.0 within +/- 0.01.
    pub fn validate(&self) -> Result<(), EngineError> {
        let sum = self.sum();
        if (sum - 1.0).abs() > 0.01 {
            return Err(EngineError::Config {
                key: "score.weights".to_string(),
                reason: format!("weights sum to {sum:.3}, expected 1.0 +/- 0.01"),
            });
        }
        Ok(())
    }
}

/// Minimum acceptable values, each within [0, 100]. A threshold of 0
/// disables its gate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreThresholds {
    pub score: u32,
    pub complexity: u32,
    pub duplication: u32,
    pub debt: u32,
    pub coupling: u32,
    pub smells: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SatdConfig {
    pub include_tests: bool,
    pub include_vendor: bool,
    /// Only `// MARKER: text` forms match in strict mode.
    pub strict_mode: bool,
}

impl Default for SatdConfig {
    fn default() -> Self {
        Self {
            include_tests: false,
            include_vendor: false,
            strict_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadCodeConfig {
    /// Minimum confidence for an item to be reported.
    pub confidence: f32,
    pub include_tests: bool,
    /// When false, fall back to textual identifier-usage matching.
    pub use_reference_graph: bool,
}

impl Default for DeadCodeConfig {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            include_tests: false,
            use_reference_graph: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    pub min_lines: usize,
    pub similarity_threshold: f64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_lines: 5,
            similarity_threshold: 0.85,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub scope: GraphScope,
    pub include_metrics: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            scope: GraphScope::File,
            include_metrics: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsAnalysisConfig {
    pub days: u32,
    pub min_cochanges: usize,
    /// Result cap for top-N style reports.
    pub top: usize,
}

impl Default for VcsAnalysisConfig {
    fn default() -> Self {
        Self {
            days: 30,
            min_cochanges: 3,
            top: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.score.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let weights = ScoreWeights {
            complexity: 0.5,
            duplication: 0.5,
            defect: 0.5,
            debt: 0.0,
            coupling: 0.0,
            smells: 0.0,
        };
        let err = weights.validate().unwrap_err();
        assert_eq!(err.kind(), "invalid-config");
    }

    #[test]
    fn test_weights_tolerance() {
        let weights = ScoreWeights {
            complexity: 0.25,
            duplication: 0.20,
            defect: 0.25,
            debt: 0.15,
            coupling: 0.10,
            smells: 0.055,
        };
        // 1.005 is inside the 0.01 tolerance band.
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str_roundtrip() {
        let config = EngineConfig::from_toml_str(
            r#"
            [analysis]
            churn_days = 60
            max_file_size = 1048576

            [score.weights]
            complexity = 0.30
            duplication = 0.20
            defect = 0.20
            debt = 0.15
            coupling = 0.10
            smells = 0.05

            [score.thresholds]
            score = 70
            complexity = 50

            [satd]
            strict_mode = true

            [vcs]
            days = 90
            min_cochanges = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.churn_days, 60);
        assert_eq!(config.analysis.max_file_size, 1_048_576);
        assert!((config.score.weights.complexity - 0.30).abs() < 1e-9);
        assert_eq!(config.score.thresholds.score, 70);
        assert!(config.satd.strict_mode);
        assert_eq!(config.vcs.days, 90);
        assert_eq!(config.vcs.min_cochanges, 5);
        // Unspecified tables keep their defaults.
        assert_eq!(config.duplicates.min_lines, 5);
    }

    #[test]
    fn test_invalid_weights_fail_loading() {
        let result = EngineConfig::from_toml_str(
            r#"
            [score.weights]
            complexity = 0.90
            duplication = 0.20
            defect = 0.20
            debt = 0.15
            coupling = 0.10
            smells = 0.05
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = EngineConfig::default();
        config.vcs.days = 0;
        assert_eq!(config.validate().unwrap_err().kind(), "invalid-period");
    }
}
