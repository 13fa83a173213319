//! Hash-based code clone detection.
//!
//! Normalized source lines are hashed in sliding windows of `min_lines`;
//! identical windows across or within files become clone pairs. Adjacent
//! overlapping pairs merge when their window overlap ratio clears the
//! similarity threshold. Per-file duplication ratios feed the TDG
//! duplication budget and the composite scorer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::config::DuplicateConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonePair {
    pub file_a: String,
    pub start_a: u32,
    pub file_b: String,
    pub start_b: u32,
    /// Length of the duplicated run, in normalized lines.
    pub lines: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicationReport {
    pub pairs: Vec<ClonePair>,
    /// Duplicated-line ratio per file, in [0, 1].
    pub file_ratios: BTreeMap<String, f64>,
    /// Duplicated lines / total significant lines across the project.
    pub project_ratio: f64,
}

pub struct DuplicateDetector {
    config: DuplicateConfig,
}

struct NormalizedLine {
    /// 1-indexed line number in the original file.
    line: u32,
    text: String,
}

impl DuplicateDetector {
    pub fn new(config: DuplicateConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, files: &[(String, String)]) -> DuplicationReport {
        let min_lines = self.config.min_lines.max(2);

        let normalized: Vec<(usize, Vec<NormalizedLine>)> = files
            .iter()
            .enumerate()
            .map(|(i, (_, source))| (i, normalize(source)))
            .collect();

        // Window hash -> (file index, window start offset).
        let mut windows: FxHashMap<u64, Vec<(usize, usize)>> = FxHashMap::default();
        for (file_idx, lines) in &normalized {
            if lines.len() < min_lines {
                continue;
            }
            for start in 0..=(lines.len() - min_lines) {
                let hash = window_hash(&lines[start..start + min_lines]);
                windows.entry(hash).or_default().push((*file_idx, start));
            }
        }

        let mut raw_pairs = Vec::new();
        let mut duplicated: Vec<Vec<bool>> = normalized
            .iter()
            .map(|(_, lines)| vec![false; lines.len()])
            .collect();

        for occurrences in windows.values() {
            if occurrences.len() < 2 {
                continue;
            }
            for (i, &(file_a, start_a)) in occurrences.iter().enumerate() {
                for &(file_b, start_b) in &occurrences[i + 1..] {
                    for offset in 0..min_lines {
                        duplicated[file_a][start_a + offset] = true;
                        duplicated[file_b][start_b + offset] = true;
                    }
                    raw_pairs.push(ClonePair {
                        file_a: files[file_a].0.clone(),
                        start_a: normalized[file_a].1[start_a].line,
                        file_b: files[file_b].0.clone(),
                        start_b: normalized[file_b].1[start_b].line,
                        lines: min_lines,
                    });
                }
            }
        }

        let pairs = merge_adjacent(raw_pairs, min_lines, self.config.similarity_threshold);

        let mut file_ratios = BTreeMap::new();
        let mut total_lines = 0usize;
        let mut total_duplicated = 0usize;
        for (file_idx, flags) in duplicated.iter().enumerate() {
            let dup = flags.iter().filter(|&&d| d).count();
            total_lines += flags.len();
            total_duplicated += dup;
            let ratio = if flags.is_empty() {
                0.0
            } else {
                dup as f64 / flags.len() as f64
            };
            file_ratios.insert(files[file_idx].0.clone(), ratio);
        }

        DuplicationReport {
            pairs,
            file_ratios,
            project_ratio: if total_lines == 0 {
                0.0
            } else {
                total_duplicated as f64 / total_lines as f64
            },
        }
    }
}

/// Significant lines only: trimmed, comments and blanks dropped.
fn normalize(source: &str) -> Vec<NormalizedLine> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with("//")
                || trimmed.starts_with('#')
                || trimmed.starts_with("/*")
                || trimmed.starts_with('*')
            {
                return None;
            }
            Some(NormalizedLine {
                line: i as u32 + 1,
                text: trimmed.to_string(),
            })
        })
        .collect()
}

fn window_hash(window: &[NormalizedLine]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = rustc_hash::FxHasher::default();
    for line in window {
        line.text.hash(&mut hasher);
    }
    hasher.finish()
}

/// Merge chains of overlapping window pairs into longer clone runs. Two
/// pairs merge when they involve the same file pair and their windows
/// overlap by at least `similarity_threshold` of the window length.
fn merge_adjacent(mut pairs: Vec<ClonePair>, min_lines: usize, threshold: f64) -> Vec<ClonePair> {
    pairs.sort_by(|a, b| {
        (&a.file_a, &a.file_b, a.start_a, a.start_b).cmp(&(&b.file_a, &b.file_b, b.start_a, b.start_b))
    });

    let max_gap = ((1.0 - threshold) * min_lines as f64).ceil() as u32 + 1;
    let mut merged: Vec<ClonePair> = Vec::new();

    for pair in pairs {
        if let Some(last) = merged.last_mut() {
            let same_files = last.file_a == pair.file_a && last.file_b == pair.file_b;
            let diag_a = pair.start_a as i64 - last.start_a as i64;
            let diag_b = pair.start_b as i64 - last.start_b as i64;
            // Start of the most recently absorbed window in this run.
            let last_window = last.start_a as i64 + last.lines as i64 - min_lines as i64;
            let step = pair.start_a as i64 - last_window;

            if same_files && diag_a == diag_b {
                if step > 0 && step <= max_gap as i64 {
                    last.lines = (pair.start_a as i64 + min_lines as i64 - last.start_a as i64)
                        as usize;
                    continue;
                }
                if step <= 0 {
                    // Window already covered by the run.
                    continue;
                }
            }
        }
        merged.push(pair);
    }

    merged
}
