//! Churn, ownership, and temporal-coupling analysis over a commit source.
//!
//! All three analyzers consume the [`Repository`] contract, poll the
//! cancellation token at every commit boundary, and enforce a wall-clock
//! timeout on the whole traversal (default five minutes).

use chrono::{DateTime, Duration, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use crate::models::churn::{
    AuthorShare, ChurnAnalysis, ChurnSummary, CoupledPair, FileChurnMetrics, FileOwnership,
    OwnershipReport, TemporalCouplingReport,
};
use crate::models::error::EngineError;
use crate::services::vcs::Repository;
use crate::utils::cancel::CancellationToken;

pub const DEFAULT_VCS_TIMEOUT_SECS: u64 = 300;

pub struct GitAnalysisService;

struct FileAccumulator {
    commits: usize,
    authors: FxHashSet<String>,
    additions: usize,
    deletions: usize,
    first_seen: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl GitAnalysisService {
    /// Per-file churn over the window.
    pub fn analyze_churn(
        repo: &dyn Repository,
        repository_root: &Path,
        period_days: u32,
        cancel: &CancellationToken,
    ) -> Result<ChurnAnalysis, EngineError> {
        if period_days == 0 {
            return Err(EngineError::InvalidPeriod { days: 0 });
        }
        info!(period_days, "analyzing code churn");

        let since = Utc::now() - Duration::days(period_days as i64);
        let commits = repo.log(Some(since), None)?;
        let deadline = Instant::now();

        let mut files: FxHashMap<String, FileAccumulator> = FxHashMap::default();
        let mut total_commits = 0usize;

        for commit in &commits {
            check_boundary(cancel, deadline)?;
            total_commits += 1;
            for stat in &commit.stats {
                let entry = files
                    .entry(stat.path.clone())
                    .or_insert_with(|| FileAccumulator {
                        commits: 0,
                        authors: FxHashSet::default(),
                        additions: 0,
                        deletions: 0,
                        first_seen: commit.timestamp,
                        last_modified: commit.timestamp,
                    });
                entry.commits += 1;
                entry.authors.insert(commit.author_name.clone());
                entry.additions += stat.additions;
                entry.deletions += stat.deletions;
                if commit.timestamp < entry.first_seen {
                    entry.first_seen = commit.timestamp;
                }
                if commit.timestamp > entry.last_modified {
                    entry.last_modified = commit.timestamp;
                }
            }
        }

        let max_commits = files.values().map(|f| f.commits).max().unwrap_or(1);
        let max_changes = files
            .values()
            .map(|f| f.additions + f.deletions)
            .max()
            .unwrap_or(1);

        let mut metrics: Vec<FileChurnMetrics> = files
            .into_iter()
            .map(|(path, acc)| {
                let mut authors: Vec<String> = acc.authors.into_iter().collect();
                authors.sort();
                let mut metric = FileChurnMetrics {
                    path,
                    commit_count: acc.commits,
                    unique_authors: authors,
                    additions: acc.additions,
                    deletions: acc.deletions,
                    churn_score: 0.0,
                    first_seen: acc.first_seen,
                    last_modified: acc.last_modified,
                };
                metric.calculate_churn_score(max_commits, max_changes);
                metric
            })
            .collect();

        metrics.sort_by(|a, b| {
            b.churn_score
                .partial_cmp(&a.churn_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });

        let summary = Self::churn_summary(&metrics, total_commits);
        Ok(ChurnAnalysis {
            generated_at: Utc::now(),
            period_days,
            repository_root: repository_root.to_path_buf(),
            files: metrics,
            summary,
        })
    }

    fn churn_summary(files: &[FileChurnMetrics], total_commits: usize) -> ChurnSummary {
        let mut author_contributions: FxHashMap<String, usize> = FxHashMap::default();
        for file in files {
            for author in &file.unique_authors {
                *author_contributions.entry(author.clone()).or_insert(0) += 1;
            }
        }

        let hotspot_files: Vec<String> = files
            .iter()
            .take(10)
            .filter(|f| f.churn_score > 0.5)
            .map(|f| f.path.clone())
            .collect();

        let stable_files: Vec<String> = files
            .iter()
            .rev()
            .take(10)
            .filter(|f| f.churn_score < 0.1 && f.commit_count > 0)
            .map(|f| f.path.clone())
            .collect();

        ChurnSummary {
            total_commits,
            total_files_changed: files.len(),
            hotspot_files,
            stable_files,
            author_contributions: author_contributions.into_iter().collect(),
        }
    }

    /// Line-level ownership from blame attribution, plus bus factors.
    pub fn analyze_ownership(
        repo: &dyn Repository,
        files: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<OwnershipReport, EngineError> {
        let deadline = Instant::now();
        let mut reports = Vec::new();
        let mut project_lines: FxHashMap<String, usize> = FxHashMap::default();

        for path in files {
            check_boundary(cancel, deadline)?;
            let attributions = repo.blame(path)?;
            let total_lines: usize = attributions.iter().map(|a| a.lines).sum();
            if total_lines == 0 {
                continue;
            }

            let mut authors: Vec<AuthorShare> = attributions
                .iter()
                .map(|a| AuthorShare {
                    author: a.author.clone(),
                    lines: a.lines,
                    share: a.lines as f64 / total_lines as f64,
                })
                .collect();
            authors.sort_by(|a, b| b.lines.cmp(&a.lines).then(a.author.cmp(&b.author)));

            for a in &attributions {
                *project_lines.entry(a.author.clone()).or_insert(0) += a.lines;
            }

            reports.push(FileOwnership {
                path: path.to_string_lossy().to_string(),
                total_lines,
                bus_factor: bus_factor(&authors.iter().map(|a| a.lines).collect::<Vec<_>>()),
                authors,
            });
        }

        let mut project: Vec<usize> = project_lines.values().copied().collect();
        project.sort_unstable_by(|a, b| b.cmp(a));

        Ok(OwnershipReport {
            files: reports,
            project_bus_factor: bus_factor(&project),
        })
    }

    /// File pairs co-changed in the same commits.
    pub fn analyze_temporal_coupling(
        repo: &dyn Repository,
        period_days: u32,
        min_cochanges: usize,
        cancel: &CancellationToken,
    ) -> Result<TemporalCouplingReport, EngineError> {
        if period_days == 0 {
            return Err(EngineError::InvalidPeriod { days: 0 });
        }
        let since = Utc::now() - Duration::days(period_days as i64);
        let commits = repo.log(Some(since), None)?;
        let deadline = Instant::now();

        let mut commit_counts: FxHashMap<String, usize> = FxHashMap::default();
        let mut cochanges: FxHashMap<(String, String), usize> = FxHashMap::default();

        for commit in &commits {
            check_boundary(cancel, deadline)?;
            let mut touched: Vec<&str> = commit.stats.iter().map(|s| s.path.as_str()).collect();
            touched.sort_unstable();
            touched.dedup();

            for path in &touched {
                *commit_counts.entry(path.to_string()).or_insert(0) += 1;
            }
            for (i, a) in touched.iter().enumerate() {
                for b in &touched[i + 1..] {
                    *cochanges
                        .entry((a.to_string(), b.to_string()))
                        .or_insert(0) += 1;
                }
            }
        }

        let mut pairs: Vec<CoupledPair> = cochanges
            .into_iter()
            .filter(|(_, count)| *count >= min_cochanges)
            .map(|((file_a, file_b), count)| {
                let commits_a = commit_counts.get(&file_a).copied().unwrap_or(1);
                let commits_b = commit_counts.get(&file_b).copied().unwrap_or(1);
                CoupledPair {
                    strength: count as f64 / commits_a.min(commits_b).max(1) as f64,
                    file_a,
                    file_b,
                    cochanges: count,
                    commits_a,
                    commits_b,
                }
            })
            .collect();

        pairs.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| (&a.file_a, &a.file_b).cmp(&(&b.file_a, &b.file_b)))
        });

        Ok(TemporalCouplingReport {
            period_days,
            min_cochanges,
            pairs,
        })
    }
}

/// Minimum author set whose lines cover at least half the total.
fn bus_factor(sorted_lines_desc: &[usize]) -> usize {
    let total: usize = sorted_lines_desc.iter().sum();
    if total == 0 {
        return 0;
    }
    let mut covered = 0usize;
    for (i, lines) in sorted_lines_desc.iter().enumerate() {
        covered += lines;
        if covered * 2 >= total {
            return i + 1;
        }
    }
    sorted_lines_desc.len()
}

fn check_boundary(cancel: &CancellationToken, started: Instant) -> Result<(), EngineError> {
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    if started.elapsed().as_secs() > DEFAULT_VCS_TIMEOUT_SECS {
        return Err(EngineError::Timeout {
            seconds: DEFAULT_VCS_TIMEOUT_SECS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vcs::test_commit as commit;
    use crate::services::vcs::{InMemoryRepository, LineAttribution};

    fn sample_repo() -> InMemoryRepository {
        InMemoryRepository::new(vec![
            commit("c4", "ann", "tweak parser", 1, vec![("parser.go", 50, 10), ("lexer.go", 5, 1)]),
            commit("c3", "bob", "fix lexer", 2, vec![("lexer.go", 8, 2), ("parser.go", 3, 1)]),
            commit("c2", "ann", "rework parser", 5, vec![("parser.go", 120, 60)]),
            commit("c1", "ann", "initial", 10, vec![("parser.go", 200, 0), ("lexer.go", 80, 0)]),
        ])
    }

    #[test]
    fn test_churn_accumulation() {
        let repo = sample_repo();
        let analysis = GitAnalysisService::analyze_churn(
            &repo,
            Path::new("."),
            30,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(analysis.period_days, 30);
        assert_eq!(analysis.summary.total_commits, 4);
        assert_eq!(analysis.summary.total_files_changed, 2);

        let parser = analysis.files.iter().find(|f| f.path == "parser.go").unwrap();
        assert_eq!(parser.commit_count, 4);
        assert_eq!(parser.additions, 373);
        assert_eq!(parser.deletions, 71);
        assert_eq!(parser.unique_authors, vec!["ann", "bob"]);
        // The busiest file saturates both normalization axes.
        assert!((parser.churn_score - 1.0).abs() < 1e-6);

        let lexer = analysis.files.iter().find(|f| f.path == "lexer.go").unwrap();
        assert!(lexer.churn_score < parser.churn_score);
    }

    #[test]
    fn test_churn_zero_period_rejected() {
        let repo = sample_repo();
        let err = GitAnalysisService::analyze_churn(
            &repo,
            Path::new("."),
            0,
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "invalid-period");
    }

    #[test]
    fn test_churn_cancellation() {
        let repo = sample_repo();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err =
            GitAnalysisService::analyze_churn(&repo, Path::new("."), 30, &cancel).unwrap_err();
        assert_eq!(err.kind(), "cancelled");
    }

    #[test]
    fn test_ownership_and_bus_factor() {
        let repo = InMemoryRepository::new(vec![]).with_blame(
            "parser.go",
            vec![
                LineAttribution { author: "ann".to_string(), lines: 60 },
                LineAttribution { author: "bob".to_string(), lines: 30 },
                LineAttribution { author: "cid".to_string(), lines: 10 },
            ],
        );

        let report = GitAnalysisService::analyze_ownership(
            &repo,
            &[PathBuf::from("parser.go")],
            &CancellationToken::new(),
        )
        .unwrap();

        let file = &report.files[0];
        assert_eq!(file.total_lines, 100);
        assert!((file.authors[0].share - 0.6).abs() < 1e-9);
        // ann alone covers >= 50%.
        assert_eq!(file.bus_factor, 1);
        assert_eq!(report.project_bus_factor, 1);
    }

    #[test]
    fn test_bus_factor_even_split() {
        assert_eq!(bus_factor(&[25, 25, 25, 25]), 2);
        assert_eq!(bus_factor(&[10]), 1);
        assert_eq!(bus_factor(&[]), 0);
    }

    #[test]
    fn test_temporal_coupling_strength() {
        let repo = InMemoryRepository::new(vec![
            commit("c5", "ann", "e", 1, vec![("a.go", 1, 0), ("b.go", 1, 0)]),
            commit("c4", "ann", "d", 2, vec![("a.go", 1, 0), ("b.go", 1, 0)]),
            commit("c3", "ann", "c", 3, vec![("a.go", 1, 0), ("b.go", 1, 0)]),
            commit("c2", "ann", "b", 4, vec![("a.go", 1, 0)]),
            commit("c1", "ann", "a", 5, vec![("c.go", 1, 0), ("a.go", 1, 0)]),
        ]);

        let report = GitAnalysisService::analyze_temporal_coupling(
            &repo,
            30,
            3,
            &CancellationToken::new(),
        )
        .unwrap();

        // Only (a.go, b.go) reaches 3 co-changes.
        assert_eq!(report.pairs.len(), 1);
        let pair = &report.pairs[0];
        assert_eq!(pair.cochanges, 3);
        assert_eq!(pair.commits_a, 5);
        assert_eq!(pair.commits_b, 3);
        // 3 / min(5, 3) = 1.0.
        assert!((pair.strength - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_coupling_below_threshold_dropped() {
        let repo = InMemoryRepository::new(vec![
            commit("c2", "ann", "b", 1, vec![("a.go", 1, 0), ("b.go", 1, 0)]),
            commit("c1", "ann", "a", 2, vec![("a.go", 1, 0), ("b.go", 1, 0)]),
        ]);
        let report = GitAnalysisService::analyze_temporal_coupling(
            &repo,
            30,
            3,
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(report.pairs.is_empty());
    }
}
