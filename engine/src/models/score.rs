//! Composite health score model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Letter grade shared by the composite scorer and the TDG analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "C-")]
    CMinus,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Grade {
        match score {
            s if s >= 95.0 => Grade::APlus,
            s if s >= 90.0 => Grade::A,
            s if s >= 85.0 => Grade::AMinus,
            s if s >= 80.0 => Grade::BPlus,
            s if s >= 75.0 => Grade::B,
            s if s >= 70.0 => Grade::BMinus,
            s if s >= 65.0 => Grade::CPlus,
            s if s >= 60.0 => Grade::C,
            s if s >= 55.0 => Grade::CMinus,
            s if s >= 50.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The six weighted subscores, each within [0, 100].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub complexity: f64,
    pub duplication: f64,
    pub defect: f64,
    pub debt: f64,
    pub coupling: f64,
    pub smells: f64,
}

/// One gate evaluation against a configured minimum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub passed: bool,
    pub actual: f64,
    pub required: f64,
}

/// Composite score report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    /// `round(sum(weight_i * component_i))`, within [0, 100].
    pub score: u32,
    pub grade: Grade,
    pub components: ScoreComponents,
    pub thresholds: BTreeMap<String, ThresholdCheck>,
    pub passed: bool,
    pub files_analyzed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}
