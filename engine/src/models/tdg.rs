//! Technical-debt gradient model.

use serde::{Deserialize, Serialize};

use crate::models::score::Grade;

/// One scored component of the per-file gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdgComponent {
    pub name: String,
    /// Maximum attainable points for this component.
    pub budget: f64,
    /// Points actually awarded, clamped to [0, budget].
    pub score: f64,
}

/// A penalty attributed to a specific issue. Duplicate issue ids are
/// coalesced so a repeated finding is not double-counted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdgIssue {
    pub issue_id: String,
    pub description: String,
    pub penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdgScore {
    pub path: String,
    /// Final score within [0, 100].
    pub value: f64,
    pub grade: Grade,
    pub components: Vec<TdgComponent>,
    pub issues: Vec<TdgIssue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TdgSummary {
    pub total_files: usize,
    pub average: f64,
    pub p95: f64,
    /// Files graded D or F.
    pub critical_files: usize,
    pub hotspots: Vec<TdgHotspot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TdgHotspot {
    pub path: String,
    pub value: f64,
    pub primary_issue: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TdgReport {
    pub files: Vec<TdgScore>,
    pub summary: TdgSummary,
}
