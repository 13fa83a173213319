//! Churn, ownership, and temporal-coupling models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnAnalysis {
    pub generated_at: DateTime<Utc>,
    pub period_days: u32,
    pub repository_root: PathBuf,
    pub files: Vec<FileChurnMetrics>,
    pub summary: ChurnSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChurnMetrics {
    pub path: String,
    pub commit_count: usize,
    pub unique_authors: Vec<String>,
    pub additions: usize,
    pub deletions: usize,
    pub churn_score: f32,
    pub first_seen: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl FileChurnMetrics {
    /// Commit count and line delta, each min-max normalized against the
    /// window maxima, combined 0.6/0.4.
    pub fn calculate_churn_score(&mut self, max_commits: usize, max_changes: usize) {
        let commit_factor = if max_commits > 0 {
            self.commit_count as f32 / max_commits as f32
        } else {
            0.0
        };

        let change_factor = if max_changes > 0 {
            (self.additions + self.deletions) as f32 / max_changes as f32
        } else {
            0.0
        };

        self.churn_score = (commit_factor * 0.6 + change_factor * 0.4).min(1.0);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub total_commits: usize,
    pub total_files_changed: usize,
    pub hotspot_files: Vec<String>,
    pub stable_files: Vec<String>,
    pub author_contributions: HashMap<String, usize>,
}

/// Share of a file's lines last touched by one author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorShare {
    pub author: String,
    pub lines: usize,
    pub share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOwnership {
    pub path: String,
    pub total_lines: usize,
    pub authors: Vec<AuthorShare>,
    /// Minimum set of authors covering >= 50% of the file's lines.
    pub bus_factor: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnershipReport {
    pub files: Vec<FileOwnership>,
    pub project_bus_factor: usize,
}

/// Two files repeatedly changed in the same commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoupledPair {
    pub file_a: String,
    pub file_b: String,
    pub cochanges: usize,
    pub commits_a: usize,
    pub commits_b: usize,
    /// `cochanges / min(commits_a, commits_b)`.
    pub strength: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalCouplingReport {
    pub period_days: u32,
    pub min_cochanges: usize,
    /// Sorted by strength, descending.
    pub pairs: Vec<CoupledPair>,
}
