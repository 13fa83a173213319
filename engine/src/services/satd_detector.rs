//! Self-admitted technical debt detection.
//!
//! Extracts and classifies debt annotations from source comments across all
//! supported languages. Pattern matching runs in one of two modes: relaxed
//! (word-boundary marker keywords plus multi-word phrases) or strict (only
//! `// MARKER: text` forms), with a set of exclusion rules applied before
//! classification to keep changelog entries, issue ids, and commit-message
//! conventions out of the results.

use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::models::config::SatdConfig;
use crate::models::syntax::Language;
use crate::services::language::line_comment_prefixes;

/// Categories of technical debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtCategory {
    Design,
    Defect,
    Requirement,
    Test,
    Performance,
    Security,
}

impl DebtCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtCategory::Design => "design",
            DebtCategory::Defect => "defect",
            DebtCategory::Requirement => "requirement",
            DebtCategory::Test => "test",
            DebtCategory::Performance => "performance",
            DebtCategory::Security => "security",
        }
    }
}

/// Severity levels, totally ordered by weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
        }
    }

    pub fn escalate(self) -> Self {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High | Severity::Critical => Severity::Critical,
        }
    }

    pub fn reduce(self) -> Self {
        match self {
            Severity::Critical => Severity::High,
            Severity::High => Severity::Medium,
            Severity::Medium | Severity::Low => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// One detected debt annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatdItem {
    pub category: DebtCategory,
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    pub description: String,
    pub marker: String,
    /// blake3 of path + line + trimmed content, first 16 hex chars.
    pub context_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatdSummary {
    pub total_items: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_file: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatdReport {
    pub items: Vec<SatdItem>,
    pub summary: SatdSummary,
    pub total_files_analyzed: usize,
    pub files_with_debt: usize,
}

struct MarkerPattern {
    marker: &'static str,
    category: DebtCategory,
    severity: Severity,
}

const MARKERS: &[MarkerPattern] = &[
    MarkerPattern { marker: "SECURITY", category: DebtCategory::Security, severity: Severity::Critical },
    MarkerPattern { marker: "VULN", category: DebtCategory::Security, severity: Severity::Critical },
    MarkerPattern { marker: "UNSAFE", category: DebtCategory::Security, severity: Severity::Critical },
    MarkerPattern { marker: "FIXME", category: DebtCategory::Defect, severity: Severity::High },
    MarkerPattern { marker: "BUG", category: DebtCategory::Defect, severity: Severity::High },
    MarkerPattern { marker: "BROKEN", category: DebtCategory::Defect, severity: Severity::High },
    MarkerPattern { marker: "XXX", category: DebtCategory::Defect, severity: Severity::Medium },
    MarkerPattern { marker: "HACK", category: DebtCategory::Design, severity: Severity::Medium },
    MarkerPattern { marker: "KLUDGE", category: DebtCategory::Design, severity: Severity::Medium },
    MarkerPattern { marker: "SMELL", category: DebtCategory::Design, severity: Severity::Medium },
    MarkerPattern { marker: "REFACTOR", category: DebtCategory::Design, severity: Severity::Medium },
    MarkerPattern { marker: "WORKAROUND", category: DebtCategory::Design, severity: Severity::Medium },
    MarkerPattern { marker: "TEMP", category: DebtCategory::Design, severity: Severity::Low },
    MarkerPattern { marker: "CLEANUP", category: DebtCategory::Design, severity: Severity::Low },
    MarkerPattern { marker: "OPTIMIZE", category: DebtCategory::Performance, severity: Severity::Low },
    MarkerPattern { marker: "TODO", category: DebtCategory::Requirement, severity: Severity::Low },
    MarkerPattern { marker: "NOTE", category: DebtCategory::Requirement, severity: Severity::Low },
    MarkerPattern { marker: "IDEA", category: DebtCategory::Requirement, severity: Severity::Low },
    MarkerPattern { marker: "IMPROVE", category: DebtCategory::Requirement, severity: Severity::Low },
];

struct PhrasePattern {
    phrase: &'static str,
    marker: &'static str,
    category: DebtCategory,
    severity: Severity,
}

const PHRASES: &[PhrasePattern] = &[
    PhrasePattern {
        phrase: r"(?i)\btechnical\s+debt\b",
        marker: "TECH-DEBT",
        category: DebtCategory::Design,
        severity: Severity::Medium,
    },
    PhrasePattern {
        phrase: r"(?i)\bcode\s+smell\b",
        marker: "SMELL",
        category: DebtCategory::Design,
        severity: Severity::Medium,
    },
];

/// Self-admitted technical debt detector with precompiled pattern sets.
pub struct SatdDetector {
    config: SatdConfig,
    marker_patterns: Vec<Regex>,
    phrase_patterns: Vec<Regex>,
    exclusions: RegexSet,
    security_terms: Regex,
}

impl Default for SatdDetector {
    fn default() -> Self {
        Self::new(SatdConfig::default())
    }
}

impl SatdDetector {
    pub fn new(config: SatdConfig) -> Self {
        let marker_patterns = MARKERS
            .iter()
            .map(|p| {
                let pattern = if config.strict_mode {
                    // Only `MARKER: text` forms after the comment prefix.
                    format!(r"^\s*{}\s*:", p.marker)
                } else {
                    format!(r"(?i)\b{}\b", p.marker)
                };
                Regex::new(&pattern).expect("marker pattern compiles")
            })
            .collect();

        let phrase_patterns = if config.strict_mode {
            Vec::new()
        } else {
            PHRASES
                .iter()
                .map(|p| Regex::new(p.phrase).expect("phrase pattern compiles"))
                .collect()
        };

        let exclusions = RegexSet::new([
            // Changelog-style markdown headers.
            r"(?i)^#{1,6}\s*(security|added|changed|fixed|removed|deprecated|unreleased)\b",
            r"(?i)\[unreleased\]",
            // Bug-tracking identifiers are references, not admissions.
            r"\bBUG-\d+\b",
            r"\b\S+-BUG-\S+\b",
            // Conventional-commit prefixes and release notes.
            r"(?i)^fix(\([^)]*\))?:",
            r"(?i)\bfixed\s+in\b",
        ])
        .expect("exclusion patterns compile");

        let security_terms = Regex::new(
            r"(?i)\b(auth|security|crypto|password|credential|token|session|sanitize|validate|injection|xss)\b",
        )
        .expect("security terms compile");

        Self {
            config,
            marker_patterns,
            phrase_patterns,
            exclusions,
            security_terms,
        }
    }

    /// Extract debt items from one file's content.
    ///
    /// `complexity_ranges` carries `(start_line, end_line, cyclomatic)` for
    /// the file's functions when known; items inside a function whose
    /// cyclomatic complexity exceeds 20 escalate one severity level.
    pub fn extract_from_content(
        &self,
        content: &str,
        path: &Path,
        complexity_ranges: &[(u32, u32, u32)],
    ) -> Vec<SatdItem> {
        if !self.config.include_vendor && is_vendor_or_minified(path) {
            return Vec::new();
        }
        let in_test_file = is_test_file(path);
        if in_test_file && !self.config.include_tests {
            return Vec::new();
        }

        let language = Language::from_path(path);
        let file = path.to_string_lossy().to_string();
        let security_path = self.security_terms.is_match(&file);

        let mut items = Vec::new();
        let mut in_test_block = false;
        let mut test_block_depth = 0usize;

        for (idx, line) in content.lines().enumerate() {
            let line_number = idx as u32 + 1;
            let trimmed = line.trim();

            // Track `#[cfg(test)]` blocks in Rust files by brace depth.
            if language == Language::Rust {
                if trimmed.starts_with("#[cfg(test)]") {
                    in_test_block = true;
                    test_block_depth = 0;
                } else if in_test_block {
                    test_block_depth += trimmed.matches('{').count();
                    let closes = trimmed.matches('}').count();
                    if closes > 0 {
                        let before = test_block_depth;
                        test_block_depth = test_block_depth.saturating_sub(closes);
                        if test_block_depth == 0 && before > 0 {
                            in_test_block = false;
                            continue;
                        }
                    }
                }
            }
            if in_test_block && !self.config.include_tests {
                continue;
            }

            // omen:ignore silences a line unconditionally.
            if trimmed.to_ascii_lowercase().contains("omen:ignore") {
                continue;
            }

            let Some(comment) = comment_content(trimmed, language) else {
                continue;
            };

            if self.exclusions.is_match(comment) || self.exclusions.is_match(trimmed) {
                continue;
            }

            if let Some((marker, category, severity)) = self.classify(comment) {
                let in_test_context = in_test_file || in_test_block;
                let hot_function = complexity_ranges
                    .iter()
                    .any(|&(start, end, cyclo)| {
                        line_number >= start && line_number <= end && cyclo > 20
                    });
                let security_context = security_path || self.security_terms.is_match(comment);

                let severity = adjust_severity(
                    severity,
                    security_context,
                    in_test_context,
                    hot_function,
                );

                items.push(SatdItem {
                    category,
                    severity,
                    file: file.clone(),
                    line: line_number,
                    description: comment.trim().to_string(),
                    marker: marker.to_string(),
                    context_hash: context_hash(&file, line_number, comment.trim()),
                });
            }
        }

        items.sort_by(|a, b| (a.line, &a.marker).cmp(&(b.line, &b.marker)));
        items
    }

    fn classify(&self, comment: &str) -> Option<(&'static str, DebtCategory, Severity)> {
        for (pattern, marker) in self.marker_patterns.iter().zip(MARKERS.iter()) {
            if pattern.is_match(comment) {
                return Some((marker.marker, marker.category, marker.severity));
            }
        }
        for (pattern, phrase) in self.phrase_patterns.iter().zip(PHRASES.iter()) {
            if pattern.is_match(comment) {
                return Some((phrase.marker, phrase.category, phrase.severity));
            }
        }
        None
    }

    /// Assemble the project report from per-file extractions.
    pub fn aggregate(&self, per_file: Vec<Vec<SatdItem>>) -> SatdReport {
        let total_files_analyzed = per_file.len();
        let mut items: Vec<SatdItem> = per_file.into_iter().flatten().collect();
        items.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));

        let mut by_severity = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut by_file: BTreeMap<String, usize> = BTreeMap::new();
        for item in &items {
            *by_severity
                .entry(item.severity.as_str().to_string())
                .or_insert(0) += 1;
            *by_category
                .entry(item.category.as_str().to_string())
                .or_insert(0) += 1;
            *by_file.entry(item.file.clone()).or_insert(0) += 1;
        }

        let files_with_debt = by_file.len();
        SatdReport {
            summary: SatdSummary {
                total_items: items.len(),
                by_severity,
                by_category,
                by_file,
            },
            items,
            total_files_analyzed,
            files_with_debt,
        }
    }
}

fn adjust_severity(
    base: Severity,
    security_context: bool,
    test_context: bool,
    hot_function: bool,
) -> Severity {
    if security_context {
        return base.escalate();
    }
    if test_context {
        return base.reduce();
    }
    if hot_function {
        return base.escalate();
    }
    base
}

/// Strip the comment prefix from a line, or `None` when the line is not a
/// comment. Only comment lines are eligible for classification.
fn comment_content<'a>(trimmed: &'a str, language: Language) -> Option<&'a str> {
    for prefix in line_comment_prefixes(language) {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Some(rest.trim_start_matches(['/', '!', ' ']));
        }
    }
    // Block comment bodies and docstring lines.
    if let Some(rest) = trimmed.strip_prefix("/*") {
        return Some(rest.trim_end_matches("*/").trim());
    }
    if let Some(rest) = trimmed.strip_prefix('*') {
        return Some(rest.trim());
    }
    if let Some(rest) = trimmed.strip_prefix("\"\"\"") {
        return Some(rest.trim_end_matches("\"\"\"").trim());
    }
    None
}

fn context_hash(file: &str, line: u32, content: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(file.as_bytes());
    hasher.update(&line.to_le_bytes());
    hasher.update(content.as_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

fn is_vendor_or_minified(path: &Path) -> bool {
    let lowered = path.to_string_lossy().to_ascii_lowercase();
    const VENDOR_DIRS: &[&str] = &[
        "vendor",
        "node_modules",
        "third_party",
        "external",
        ".venv",
        "site-packages",
        ".cargo",
    ];
    if path
        .components()
        .any(|c| VENDOR_DIRS.contains(&c.as_os_str().to_string_lossy().as_ref()))
    {
        return true;
    }
    lowered.ends_with(".min.js") || lowered.ends_with(".min.css")
}

/// Naming heuristics shared with the dead-code analyzer.
pub fn is_test_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let in_test_dir = path.components().any(|c| {
        let c = c.as_os_str().to_string_lossy();
        c == "tests" || c == "test" || c == "__tests__"
    });

    in_test_dir
        || name.starts_with("test_")
        || name.ends_with("_test.go")
        || name.ends_with("_test.rs")
        || name.ends_with("_test.py")
        || name.ends_with("_tests.rs")
        || name.ends_with(".test.js")
        || name.ends_with(".test.ts")
        || name.ends_with(".test.tsx")
        || name.ends_with(".spec.js")
        || name.ends_with(".spec.ts")
        || name.ends_with("Test.java")
        || name.ends_with("_spec.rb")
}
