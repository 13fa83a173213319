//! Just-in-time change-risk prediction.
//!
//! Extracts Kamei-style features per commit, runs a chronological second
//! pass for the state-dependent features (prior changes, prior developers,
//! author experience), normalizes by the 95th percentile of the commit set,
//! and scores a weighted sum. Risk levels are percentile-banded over the
//! population, with fixed thresholds as the single-commit fallback.

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::RegexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Instant;
use tracing::debug;

use crate::models::error::EngineError;
use crate::models::risk::{
    ChangeRiskReport, ChangeRiskSummary, CommitFeatures, CommitRisk, RiskLevel,
};
use crate::services::git_analysis::DEFAULT_VCS_TIMEOUT_SECS;
use crate::services::vcs::{CommitRecord, Repository};
use crate::utils::cancel::CancellationToken;

const WEIGHT_FIX: f64 = 0.25;
const WEIGHT_ENTROPY: f64 = 0.20;
const WEIGHT_LINES_ADDED: f64 = 0.20;
const WEIGHT_UNIQUE_CHANGES: f64 = 0.10;
const WEIGHT_NUM_FILES: f64 = 0.10;
const WEIGHT_LINES_DELETED: f64 = 0.05;
const WEIGHT_NUM_DEVELOPERS: f64 = 0.05;
const WEIGHT_EXPERIENCE: f64 = 0.05;

/// Flat score for automated commits.
const AUTOMATED_SCORE: f64 = 0.05;

static FIX_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\bfix(es|ed|ing)?\b",
        r"(?i)\bbug\b",
        r"(?i)\bpatch\b",
        r"(?i)\bresolve[sd]?\b",
        r"(?i)\bclose[sd]?\s+#\d+",
        r"(?i)\bdefect\b",
        r"(?i)\berror\b",
        r"(?i)\bcrash\b",
        r"(?i)\bfault\b",
        r"(?i)\bfailure\b",
    ])
    .expect("fix patterns compile")
});

static AUTOMATED_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)^chore: update tag",
        r"(?i)\[skip ci\]",
        r"(?i)^merge pull request",
        r"(?i)^merge branch",
        r"(?i)^chore\(deps\):",
        r"(?i)^chore: bump version",
        r"(?i)^ci:",
        r"(?i)^docs:",
        r"(?i)^style:",
        r"(?i)^release\b",
        r"(?i)dependabot",
    ])
    .expect("automated patterns compile")
});

pub struct ChangeRiskAnalyzer;

impl Default for ChangeRiskAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeRiskAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze the window of commits ending now.
    pub fn analyze(
        &self,
        repo: &dyn Repository,
        period_days: u32,
        cancel: &CancellationToken,
    ) -> Result<ChangeRiskReport, EngineError> {
        if period_days == 0 {
            return Err(EngineError::InvalidPeriod { days: 0 });
        }
        let since = Utc::now() - Duration::days(period_days as i64);
        let commits = repo.log(Some(since), None)?;

        let features = self.extract_features(&commits, cancel)?;
        Ok(self.score(features))
    }

    /// First pass: per-commit features from the diff; second pass in
    /// chronological order for the state-dependent ones.
    ///
    /// Commit sources yield newest-first, so the list is reversed before
    /// the stateful pass; running state updates only AFTER a commit's
    /// features are recorded.
    pub fn extract_features(
        &self,
        commits: &[CommitRecord],
        cancel: &CancellationToken,
    ) -> Result<Vec<CommitFeatures>, EngineError> {
        let started = Instant::now();
        let mut features = Vec::new();

        for commit in commits {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            if started.elapsed().as_secs() > DEFAULT_VCS_TIMEOUT_SECS {
                return Err(EngineError::Timeout {
                    seconds: DEFAULT_VCS_TIMEOUT_SECS,
                });
            }
            // The initial commit has no parent to diff against.
            if commit.parent_count == 0 {
                continue;
            }

            let lines_added: usize = commit.stats.iter().map(|s| s.additions).sum();
            let lines_deleted: usize = commit.stats.iter().map(|s| s.deletions).sum();
            let files: Vec<String> = commit.stats.iter().map(|s| s.path.clone()).collect();

            features.push(CommitFeatures {
                hash: commit.hash.clone(),
                author: commit.author_name.clone(),
                message: commit.message.clone(),
                timestamp: commit.timestamp,
                is_fix: FIX_PATTERNS.is_match(&commit.message),
                is_automated: AUTOMATED_PATTERNS.is_match(&commit.message),
                entropy: change_entropy(&commit.stats.iter().map(|s| s.additions + s.deletions).collect::<Vec<_>>()),
                lines_added,
                lines_deleted,
                num_files: files.len(),
                unique_changes: 0,
                num_developers: 0,
                author_experience: 0,
                files,
            });
        }

        // Chronological second pass. State updates after recording: a
        // commit must not see its own contribution.
        features.reverse();
        let mut file_commits: FxHashMap<String, usize> = FxHashMap::default();
        let mut file_authors: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
        let mut author_commits: FxHashMap<String, usize> = FxHashMap::default();

        for feature in features.iter_mut() {
            feature.unique_changes = feature
                .files
                .iter()
                .map(|f| file_commits.get(f).copied().unwrap_or(0))
                .sum();
            let mut developers: FxHashSet<&String> = FxHashSet::default();
            for file in &feature.files {
                if let Some(authors) = file_authors.get(file) {
                    developers.extend(authors.iter());
                }
            }
            feature.num_developers = developers.len();
            feature.author_experience = author_commits
                .get(&feature.author)
                .copied()
                .unwrap_or(0);

            for file in &feature.files {
                *file_commits.entry(file.clone()).or_insert(0) += 1;
                file_authors
                    .entry(file.clone())
                    .or_default()
                    .insert(feature.author.clone());
            }
            *author_commits.entry(feature.author.clone()).or_insert(0) += 1;
        }

        // Report newest-first again.
        features.reverse();
        debug!(commits = features.len(), "extracted change-risk features");
        Ok(features)
    }

    /// Weighted risk scores plus percentile-banded levels.
    pub fn score(&self, features: Vec<CommitFeatures>) -> ChangeRiskReport {
        if features.is_empty() {
            return ChangeRiskReport::default();
        }

        let p95 = |values: Vec<f64>| -> f64 {
            let mut sorted = values;
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let idx = (sorted.len() * 95 / 100).min(sorted.len() - 1);
            let v = sorted[idx];
            // The divisor must never be zero.
            if v > 0.0 {
                v
            } else {
                1.0
            }
        };

        let p95_entropy = p95(features.iter().map(|f| f.entropy).collect());
        let p95_added = p95(features.iter().map(|f| f.lines_added as f64).collect());
        let p95_deleted = p95(features.iter().map(|f| f.lines_deleted as f64).collect());
        let p95_files = p95(features.iter().map(|f| f.num_files as f64).collect());
        let p95_unique = p95(features.iter().map(|f| f.unique_changes as f64).collect());
        let p95_developers = p95(features.iter().map(|f| f.num_developers as f64).collect());
        let p95_experience = p95(features.iter().map(|f| f.author_experience as f64).collect());

        let normalize = |value: f64, divisor: f64| (value / divisor).min(1.0);

        let scored: Vec<(f64, Vec<String>)> = features
            .iter()
            .map(|f| {
                if f.is_automated {
                    return (AUTOMATED_SCORE, Vec::new());
                }

                let entropy = normalize(f.entropy, p95_entropy);
                let added = normalize(f.lines_added as f64, p95_added);
                let deleted = normalize(f.lines_deleted as f64, p95_deleted);
                let num_files = normalize(f.num_files as f64, p95_files);
                let unique = normalize(f.unique_changes as f64, p95_unique);
                let developers = normalize(f.num_developers as f64, p95_developers);
                // Experience is protective; inexperience raises risk.
                let inexperience = 1.0 - normalize(f.author_experience as f64, p95_experience);

                let contributions = [
                    ("fix", WEIGHT_FIX * if f.is_fix { 1.0 } else { 0.0 }),
                    ("entropy", WEIGHT_ENTROPY * entropy),
                    ("lines_added", WEIGHT_LINES_ADDED * added),
                    ("unique_changes", WEIGHT_UNIQUE_CHANGES * unique),
                    ("num_files", WEIGHT_NUM_FILES * num_files),
                    ("lines_deleted", WEIGHT_LINES_DELETED * deleted),
                    ("num_developers", WEIGHT_NUM_DEVELOPERS * developers),
                    ("experience", WEIGHT_EXPERIENCE * inexperience),
                ];
                let score: f64 = contributions.iter().map(|(_, c)| c).sum::<f64>().clamp(0.0, 1.0);
                (score, recommendations(score, &contributions))
            })
            .collect();

        // Percentile bands over the population; fixed thresholds when a
        // single commit has no population to rank against.
        let (high_cut, medium_cut) = if scored.len() > 1 {
            let mut sorted: Vec<f64> = scored.iter().map(|(s, _)| *s).collect();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let at = |p: usize| sorted[(sorted.len() * p / 100).min(sorted.len() - 1)];
            (at(95), at(80))
        } else {
            (0.6, 0.3)
        };

        let commits: Vec<CommitRisk> = features
            .into_iter()
            .zip(scored)
            .map(|(f, (score, recommendations))| {
                let level = if score > high_cut {
                    RiskLevel::High
                } else if score > medium_cut {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                };
                CommitRisk {
                    hash: f.hash.clone(),
                    author: f.author.clone(),
                    message: f.message.clone(),
                    timestamp: f.timestamp,
                    score,
                    level,
                    recommendations,
                    features: f,
                }
            })
            .collect();

        let total = commits.len();
        let high_risk = commits.iter().filter(|c| c.level == RiskLevel::High).count();
        let medium_risk = commits.iter().filter(|c| c.level == RiskLevel::Medium).count();
        let avg_score = commits.iter().map(|c| c.score).sum::<f64>() / total.max(1) as f64;

        ChangeRiskReport {
            summary: ChangeRiskSummary {
                total_commits: total,
                high_risk,
                medium_risk,
                low_risk: total - high_risk - medium_risk,
                avg_score,
            },
            commits,
        }
    }
}

/// Shannon entropy of the per-file line-change distribution.
fn change_entropy(changes: &[usize]) -> f64 {
    let total: usize = changes.iter().sum();
    if total == 0 {
        return 0.0;
    }
    changes
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

fn recommendations(score: f64, contributions: &[(&str, f64)]) -> Vec<String> {
    let mut out = Vec::new();

    for (factor, contribution) in contributions {
        match *factor {
            "entropy" if *contribution > 0.15 => out.push(
                "Change is scattered across files; consider splitting into focused commits"
                    .to_string(),
            ),
            "lines_added" if *contribution > 0.15 => {
                out.push("Large addition; review in smaller increments".to_string())
            }
            "num_files" if *contribution > 0.08 => {
                out.push("Many files touched in one commit; verify the change is cohesive".to_string())
            }
            "experience" if *contribution > 0.04 => out.push(
                "Author has little history in this repository; consider a second reviewer"
                    .to_string(),
            ),
            _ => {}
        }
    }

    if score > 0.6 {
        out.push("High-risk change; add tests covering the modified paths".to_string());
    } else if score > 0.3 {
        out.push("Moderate risk; a focused review of the diff is advisable".to_string());
    }
    out
}
