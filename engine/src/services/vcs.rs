//! Version-control input contracts.
//!
//! VCS-backed analyzers consume these traits only; nothing in the engine
//! assumes git specifically. [`GitRepository`] is the default adapter,
//! [`InMemoryRepository`] backs tests and virtual histories.

use chrono::{DateTime, TimeZone, Utc};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::error::EngineError;

/// Per-file line deltas of one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub path: String,
    pub additions: usize,
    pub deletions: usize,
}

#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub parent_count: usize,
    pub stats: Vec<FileStat>,
}

/// Lines last touched by one author in a file.
#[derive(Debug, Clone)]
pub struct LineAttribution {
    pub author: String,
    pub lines: usize,
}

/// Repository contract for the VCS-backed analyzers.
///
/// `log` returns commits NEWEST FIRST. The change-risk predictor's
/// state-dependent features depend on this ordering: it reverses the list
/// into chronological order before its second pass, so an adapter that
/// yields any other order produces wrong NUC/NDEV/EXP values.
pub trait Repository {
    fn log(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitRecord>, EngineError>;

    fn blame(&self, path: &Path) -> Result<Vec<LineAttribution>, EngineError>;
}

/// Default git-backed adapter.
pub struct GitRepository {
    repo: git2::Repository,
    root: PathBuf,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("root", &self.root)
            .finish()
    }
}

impl GitRepository {
    /// Open an existing repository; a missing one is the typed
    /// `no-git-repository` error.
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let repo = git2::Repository::discover(path).map_err(|_| EngineError::NoGitRepository {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            root: path.to_path_buf(),
            repo,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn commit_stats(&self, commit: &git2::Commit<'_>) -> Result<Vec<FileStat>, EngineError> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut stats = Vec::new();
        let delta_count = diff.deltas().len();
        for idx in 0..delta_count {
            let Some(delta) = diff.get_delta(idx) else {
                continue;
            };
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();
            if path.is_empty() {
                continue;
            }

            let (additions, deletions) =
                match git2::Patch::from_diff(&diff, idx)? {
                    Some(patch) => {
                        let (_, additions, deletions) = patch.line_stats()?;
                        (additions, deletions)
                    }
                    None => (0, 0),
                };
            stats.push(FileStat {
                path,
                additions,
                deletions,
            });
        }
        Ok(stats)
    }
}

impl Repository for GitRepository {
    fn log(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitRecord>, EngineError> {
        let mut walk = self.repo.revwalk()?;
        walk.push_head()?;
        walk.set_sorting(git2::Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in walk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            let timestamp = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_else(Utc::now);

            if let Some(until) = until {
                if timestamp > until {
                    continue;
                }
            }
            if let Some(since) = since {
                // Revwalk is newest-first; everything older is out of window.
                if timestamp < since {
                    break;
                }
            }

            let author = commit.author();
            commits.push(CommitRecord {
                hash: oid.to_string(),
                author_name: author.name().unwrap_or("unknown").to_string(),
                author_email: author.email().unwrap_or("").to_string(),
                timestamp,
                message: commit.message().unwrap_or("").to_string(),
                parent_count: commit.parent_count(),
                stats: self.commit_stats(&commit)?,
            });
        }

        debug!(commits = commits.len(), "git log traversal complete");
        Ok(commits)
    }

    fn blame(&self, path: &Path) -> Result<Vec<LineAttribution>, EngineError> {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let blame = self.repo.blame_file(relative, None)?;

        let mut by_author: FxHashMap<String, usize> = FxHashMap::default();
        for hunk in blame.iter() {
            let author = hunk
                .final_signature()
                .name()
                .unwrap_or("unknown")
                .to_string();
            *by_author.entry(author).or_insert(0) += hunk.lines_in_hunk();
        }

        let mut attributions: Vec<LineAttribution> = by_author
            .into_iter()
            .map(|(author, lines)| LineAttribution { author, lines })
            .collect();
        attributions.sort_by(|a, b| b.lines.cmp(&a.lines).then(a.author.cmp(&b.author)));
        Ok(attributions)
    }
}

/// Fixed history, newest-first, for tests and virtual repositories.
#[derive(Default)]
pub struct InMemoryRepository {
    pub commits: Vec<CommitRecord>,
    pub blames: FxHashMap<String, Vec<LineAttribution>>,
}

impl InMemoryRepository {
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        Self {
            commits,
            blames: FxHashMap::default(),
        }
    }

    pub fn with_blame(mut self, path: &str, attributions: Vec<LineAttribution>) -> Self {
        self.blames.insert(path.to_string(), attributions);
        self
    }
}

impl Repository for InMemoryRepository {
    fn log(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitRecord>, EngineError> {
        Ok(self
            .commits
            .iter()
            .filter(|c| since.is_none_or(|s| c.timestamp >= s))
            .filter(|c| until.is_none_or(|u| c.timestamp <= u))
            .cloned()
            .collect())
    }

    fn blame(&self, path: &Path) -> Result<Vec<LineAttribution>, EngineError> {
        Ok(self
            .blames
            .get(&path.to_string_lossy().to_string())
            .cloned()
            .unwrap_or_default())
    }
}

/// Test-history builder shared by the VCS-backed analyzer tests.
#[cfg(test)]
pub(crate) fn test_commit(
    hash: &str,
    author: &str,
    message: &str,
    age_days: i64,
    stats: Vec<(&str, usize, usize)>,
) -> CommitRecord {
    CommitRecord {
        hash: hash.to_string(),
        author_name: author.to_string(),
        author_email: format!("{author}@example.com"),
        timestamp: Utc::now() - chrono::Duration::days(age_days),
        message: message.to_string(),
        parent_count: 1,
        stats: stats
            .into_iter()
            .map(|(path, additions, deletions)| FileStat {
                path: path.to_string(),
                additions,
                deletions,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use super::test_commit as commit;

    #[test]
    fn test_open_non_repository_is_typed_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = GitRepository::open(dir.path()).unwrap_err();
        assert_eq!(err.kind(), "no-git-repository");
    }

    #[test]
    fn test_in_memory_window_filter() {
        let repo = InMemoryRepository::new(vec![
            commit("c2", "ann", "newer", 1, vec![("a.go", 5, 1)]),
            commit("c1", "bob", "older", 40, vec![("a.go", 2, 0)]),
        ]);

        let all = repo.log(None, None).unwrap();
        assert_eq!(all.len(), 2);

        let windowed = repo
            .log(Some(Utc::now() - Duration::days(30)), None)
            .unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].hash, "c2");
    }

    #[test]
    fn test_in_memory_blame() {
        let repo = InMemoryRepository::new(vec![]).with_blame(
            "a.go",
            vec![
                LineAttribution {
                    author: "ann".to_string(),
                    lines: 30,
                },
                LineAttribution {
                    author: "bob".to_string(),
                    lines: 10,
                },
            ],
        );
        let blame = repo.blame(Path::new("a.go")).unwrap();
        assert_eq!(blame.len(), 2);
        assert_eq!(blame[0].author, "ann");
    }
}
