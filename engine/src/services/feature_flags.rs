//! Feature-flag reference detection and staleness analysis.
//!
//! Provider patterns are authored externally in `flag_patterns.json`,
//! embedded at build time, and compiled once at detector construction. A
//! match yields a flag reference with its conditional nesting depth;
//! per-flag aggregation adds complexity, staleness (when VCS history is
//! attached), and a risk/effort priority band.

use chrono::Utc;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::error::EngineError;
use crate::models::syntax::ParsedFile;
use crate::services::language::{call_types, conditional_types};
use crate::services::vcs::Repository;

const EMBEDDED_PATTERNS: &str = include_str!("flag_patterns.json");

#[derive(Debug, Deserialize)]
struct PatternSpec {
    provider: String,
    #[allow(dead_code)]
    languages: Vec<String>,
    pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagReference {
    pub key: String,
    pub provider: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub nesting_depth: u32,
    /// Other flags referenced in the same file; filled at aggregation.
    #[serde(default)]
    pub sibling_flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagStaleness {
    pub days_since_introduction: i64,
    pub days_since_last_change: i64,
    pub authors: Vec<String>,
    pub commit_count: usize,
    pub staleness_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlagPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagAnalysis {
    pub key: String,
    pub references: Vec<FlagReference>,
    /// Distinct files referencing the flag.
    pub file_spread: usize,
    pub max_nesting_depth: u32,
    /// Reference count; every reference is a decision point.
    pub decision_points: usize,
    /// Other flags referenced in the same files.
    pub coupled_flags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staleness: Option<FlagStaleness>,
    pub priority: FlagPriority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureFlagReport {
    pub flags: Vec<FlagAnalysis>,
    pub total_references: usize,
}

pub struct FeatureFlagDetector {
    patterns: Vec<(String, Regex)>,
}

impl Default for FeatureFlagDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureFlagDetector {
    pub fn new() -> Self {
        let specs: Vec<PatternSpec> =
            serde_json::from_str(EMBEDDED_PATTERNS).expect("embedded flag patterns parse");
        let patterns = specs
            .into_iter()
            .map(|spec| {
                let regex = Regex::new(&spec.pattern).expect("flag pattern compiles");
                (spec.provider, regex)
            })
            .collect();
        Self { patterns }
    }

    /// Find flag references in one parsed file.
    pub fn scan_file(&self, parsed: &ParsedFile) -> Vec<FlagReference> {
        let file = parsed.path.to_string_lossy().to_string();
        let calls = call_types(parsed.language);
        let conditionals = conditional_types(parsed.language);
        let mut references = Vec::new();

        crate::services::parser::visit_typed(parsed.root(), &mut |kind, node| {
            if !calls.contains(&kind) {
                return true;
            }
            let text = parsed.node_text(node);
            let head = text.lines().next().unwrap_or(text);

            for (provider, regex) in &self.patterns {
                if let Some(captures) = regex.captures(head) {
                    if let Some(key) = captures.get(1) {
                        references.push(FlagReference {
                            key: key.as_str().to_string(),
                            provider: provider.clone(),
                            file: file.clone(),
                            line: ParsedFile::start_line(node),
                            column: node.start_position().column as u32 + 1,
                            nesting_depth: conditional_depth(node, conditionals),
                            sibling_flags: Vec::new(),
                        });
                        break;
                    }
                }
            }
            true
        });

        references
    }

    /// Batch nesting-depth lookup: one walk serving a sorted line list.
    pub fn depths_at_lines(&self, parsed: &ParsedFile, lines: &[u32]) -> Vec<u32> {
        let conditionals = conditional_types(parsed.language);
        let mut depths = vec![0u32; lines.len()];

        depth_walk(parsed.root(), conditionals, 0, &mut |node, depth| {
            let start = ParsedFile::start_line(node);
            let end = ParsedFile::end_line(node);
            for (i, &line) in lines.iter().enumerate() {
                if line >= start && line <= end && depth > depths[i] {
                    depths[i] = depth;
                }
            }
        });

        depths
    }

    /// Aggregate references per flag key; attach staleness when a
    /// repository is available.
    pub fn aggregate(
        &self,
        references: Vec<FlagReference>,
        repo: Option<&dyn Repository>,
    ) -> Result<FeatureFlagReport, EngineError> {
        let total_references = references.len();
        let mut by_key: FxHashMap<String, Vec<FlagReference>> = FxHashMap::default();
        let mut flags_by_file: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();

        for reference in references {
            flags_by_file
                .entry(reference.file.clone())
                .or_default()
                .insert(reference.key.clone());
            by_key.entry(reference.key.clone()).or_default().push(reference);
        }

        let mut flags = Vec::new();
        for (key, mut references) in by_key {
            for reference in references.iter_mut() {
                if let Some(siblings) = flags_by_file.get(&reference.file) {
                    reference.sibling_flags =
                        siblings.iter().filter(|s| **s != key).cloned().collect();
                    reference.sibling_flags.sort();
                }
            }
            let files: FxHashSet<&str> =
                references.iter().map(|r| r.file.as_str()).collect();
            let max_nesting_depth = references.iter().map(|r| r.nesting_depth).max().unwrap_or(0);

            let mut coupled: FxHashSet<String> = FxHashSet::default();
            for file in &files {
                if let Some(siblings) = flags_by_file.get(*file) {
                    coupled.extend(siblings.iter().filter(|s| **s != key).cloned());
                }
            }
            let mut coupled_flags: Vec<String> = coupled.into_iter().collect();
            coupled_flags.sort();

            let staleness = match repo {
                Some(repo) => Some(self.staleness(repo, &references)?),
                None => None,
            };

            let decision_points = references.len();
            let priority = priority(
                staleness.as_ref().map(|s| s.staleness_score).unwrap_or(0.0),
                decision_points,
                max_nesting_depth,
                files.len(),
            );

            flags.push(FlagAnalysis {
                key,
                file_spread: files.len(),
                max_nesting_depth,
                decision_points,
                coupled_flags,
                staleness,
                priority,
                references,
            });
        }

        flags.sort_by(|a, b| a.key.cmp(&b.key));
        debug!(flags = flags.len(), total_references, "feature flag aggregation");
        Ok(FeatureFlagReport {
            flags,
            total_references,
        })
    }

    fn staleness(
        &self,
        repo: &dyn Repository,
        references: &[FlagReference],
    ) -> Result<FlagStaleness, EngineError> {
        let files: FxHashSet<&str> = references.iter().map(|r| r.file.as_str()).collect();
        let commits = repo.log(None, None)?;

        let mut authors: FxHashSet<String> = FxHashSet::default();
        let mut commit_count = 0usize;
        let mut first = None;
        let mut last = None;

        for commit in &commits {
            if !commit.stats.iter().any(|s| files.contains(s.path.as_str())) {
                continue;
            }
            commit_count += 1;
            authors.insert(commit.author_name.clone());
            first = Some(first.map_or(commit.timestamp, |f: chrono::DateTime<Utc>| {
                f.min(commit.timestamp)
            }));
            last = Some(last.map_or(commit.timestamp, |l: chrono::DateTime<Utc>| {
                l.max(commit.timestamp)
            }));
        }

        let now = Utc::now();
        let days_since_introduction = first.map_or(0, |f| (now - f).num_days());
        let days_since_last_change = last.map_or(0, |l| (now - l).num_days());

        // A flag is expected to live about a month; every further month is
        // overdue.
        let overdue_months = ((days_since_introduction - 30).max(0) as f64) / 30.0;
        let stale_bonus = if days_since_last_change > 60 { 2.0 } else { 0.0 };
        let staleness_score = 2.0 * overdue_months + stale_bonus;

        let mut authors: Vec<String> = authors.into_iter().collect();
        authors.sort();

        Ok(FlagStaleness {
            days_since_introduction,
            days_since_last_change,
            authors,
            commit_count,
            staleness_score,
        })
    }
}

fn conditional_depth(node: tree_sitter::Node<'_>, conditionals: &[&str]) -> u32 {
    let mut depth = 0;
    let mut current = node.parent();
    while let Some(parent) = current {
        if conditionals.contains(&parent.kind()) {
            depth += 1;
        }
        current = parent.parent();
    }
    depth
}

fn depth_walk<F>(node: tree_sitter::Node<'_>, conditionals: &[&str], depth: u32, f: &mut F)
where
    F: FnMut(tree_sitter::Node<'_>, u32),
{
    let here = if conditionals.contains(&node.kind()) {
        depth + 1
    } else {
        depth
    };
    if here > depth {
        f(node, here);
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            depth_walk(child, conditionals, here, f);
        }
    }
}

/// Risk over effort, banded at 5 / 10 / 20.
fn priority(
    staleness_score: f64,
    decision_points: usize,
    max_nesting: u32,
    file_spread: usize,
) -> FlagPriority {
    let risk = staleness_score + decision_points as f64 + 2.0 * max_nesting as f64;
    let effort = file_spread.max(1) as f64;
    let value = risk / effort * 10.0;

    if value >= 20.0 {
        FlagPriority::Critical
    } else if value >= 10.0 {
        FlagPriority::High
    } else if value >= 5.0 {
        FlagPriority::Medium
    } else {
        FlagPriority::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parser::SourceParser;
    use crate::services::vcs::test_commit as commit;
    use std::path::PathBuf;
    use crate::services::vcs::InMemoryRepository;

    fn parse(source: &str, name: &str) -> ParsedFile {
        let mut parser = SourceParser::new();
        let path = PathBuf::from(name);
        let language = SourceParser::language_of(&path);
        parser
            .parse_source(&path, source.to_string(), language)
            .unwrap()
    }

    #[test]
    fn test_detects_unleash_style_reference() {
        let detector = FeatureFlagDetector::new();
        let parsed = parse(
            "def handler(client):\n    if client.is_enabled(\"new-checkout\"):\n        return render_new()\n    return render_old()\n",
            "views.py",
        );
        let refs = detector.scan_file(&parsed);

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].key, "new-checkout");
        assert_eq!(refs[0].provider, "unleash");
        assert_eq!(refs[0].line, 2);
        // The call sits inside the if's condition, not below it.
        assert_eq!(refs[0].nesting_depth, 1);
    }

    #[test]
    fn test_nesting_depth_counts_enclosing_conditionals() {
        let source = r#"
def route(client, user):
    if user.active:
        if user.beta:
            if client.is_enabled("deep-flag"):
                return 1
    return 0
"#;
        let detector = FeatureFlagDetector::new();
        let refs = detector.scan_file(&parse(source, "route.py"));
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].nesting_depth, 3);
    }

    #[test]
    fn test_batch_depths_match_single_walks() {
        let source = r#"
def f(a, b):
    if a:
        x = 1
        if b:
            y = 2
    z = 3
"#;
        let detector = FeatureFlagDetector::new();
        let parsed = parse(source, "depths.py");
        let depths = detector.depths_at_lines(&parsed, &[4, 6, 7]);
        assert_eq!(depths, vec![1, 2, 0]);
    }

    #[test]
    fn test_launchdarkly_and_custom_patterns() {
        let detector = FeatureFlagDetector::new();
        let parsed = parse(
            "func gate(ldClient *Client) {\n\tif ldClient.BoolVariation(\"dark-mode\", false) {\n\t\trender()\n\t}\n\tif featureFlag(\"beta.search\") {\n\t\tsearch()\n\t}\n}\n",
            "gate.go",
        );
        let refs = detector.scan_file(&parsed);
        let keys: Vec<&str> = refs.iter().map(|r| r.key.as_str()).collect();
        assert!(keys.contains(&"dark-mode"));
        assert!(keys.contains(&"beta.search"));
    }

    #[test]
    fn test_aggregate_coupling_and_spread() {
        let detector = FeatureFlagDetector::new();
        let a = detector.scan_file(&parse(
            "def f(c):\n    if c.is_enabled(\"one\"):\n        pass\n    if c.is_enabled(\"two\"):\n        pass\n",
            "a.py",
        ));
        let b = detector.scan_file(&parse(
            "def g(c):\n    if c.is_enabled(\"one\"):\n        pass\n",
            "b.py",
        ));

        let report = detector
            .aggregate(a.into_iter().chain(b).collect(), None)
            .unwrap();

        assert_eq!(report.total_references, 3);
        let one = report.flags.iter().find(|f| f.key == "one").unwrap();
        assert_eq!(one.file_spread, 2);
        assert_eq!(one.decision_points, 2);
        assert_eq!(one.coupled_flags, vec!["two"]);

        let two = report.flags.iter().find(|f| f.key == "two").unwrap();
        assert_eq!(two.file_spread, 1);
        assert_eq!(two.coupled_flags, vec!["one"]);

        // Reference-level siblings reflect the owning file only.
        let in_a = one.references.iter().find(|r| r.file == "a.py").unwrap();
        assert_eq!(in_a.sibling_flags, vec!["two"]);
        let in_b = one.references.iter().find(|r| r.file == "b.py").unwrap();
        assert!(in_b.sibling_flags.is_empty());
    }

    #[test]
    fn test_staleness_from_history() {
        let detector = FeatureFlagDetector::new();
        let refs = detector.scan_file(&parse(
            "def f(c):\n    if c.is_enabled(\"old-flag\"):\n        pass\n",
            "legacy.py",
        ));

        let repo = InMemoryRepository::new(vec![
            commit("c2", "bob", "touch", 100, vec![("legacy.py", 2, 1)]),
            commit("c1", "ann", "introduce flag", 200, vec![("legacy.py", 10, 0)]),
        ]);

        let report = detector.aggregate(refs, Some(&repo)).unwrap();
        let flag = &report.flags[0];
        let staleness = flag.staleness.as_ref().unwrap();

        assert_eq!(staleness.commit_count, 2);
        assert_eq!(staleness.authors, vec!["ann", "bob"]);
        assert!(staleness.days_since_introduction >= 199);
        assert!(staleness.days_since_last_change >= 99);
        // ~170 overdue days plus the stale bonus.
        assert!(staleness.staleness_score > 10.0);
        assert_eq!(flag.priority, FlagPriority::Critical);
    }

    #[test]
    fn test_priority_bands() {
        assert_eq!(priority(0.0, 1, 0, 1), FlagPriority::High);
        assert_eq!(priority(0.0, 1, 0, 4), FlagPriority::Low);
        assert_eq!(priority(20.0, 4, 2, 1), FlagPriority::Critical);
        assert_eq!(priority(0.0, 2, 0, 4), FlagPriority::Medium);
    }

    #[test]
    fn test_no_flags_in_plain_code() {
        let detector = FeatureFlagDetector::new();
        let refs = detector.scan_file(&parse(
            "def f():\n    return is_valid(\"input\")\n",
            "plain.py",
        ));
        assert!(refs.is_empty());
    }
}
