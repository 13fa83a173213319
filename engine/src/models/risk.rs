//! Change-risk (JIT defect prediction) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-commit features in the Kamei et al. style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitFeatures {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_fix: bool,
    pub is_automated: bool,
    /// Shannon entropy of the per-file line-change distribution.
    pub entropy: f64,
    pub lines_added: usize,
    pub lines_deleted: usize,
    pub num_files: usize,
    /// Sum of prior changes to the touched files (NUC).
    pub unique_changes: usize,
    /// Distinct prior authors of the touched files (NDEV).
    pub num_developers: usize,
    /// Prior commits by this author (EXP).
    pub author_experience: usize,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRisk {
    pub hash: String,
    pub author: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Always within [0, 1].
    pub score: f64,
    pub level: RiskLevel,
    pub recommendations: Vec<String>,
    pub features: CommitFeatures,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeRiskSummary {
    pub total_commits: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeRiskReport {
    pub commits: Vec<CommitRisk>,
    pub summary: ChangeRiskSummary,
}
