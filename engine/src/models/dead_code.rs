//! Dead code report model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::symbols::DefinitionKind;

/// One definition classified dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadItem {
    pub name: String,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub visibility: String,
    /// Always within [0, 1].
    pub confidence: f32,
    pub reason: String,
    pub kind: DefinitionKind,
    pub node_id: u32,
}

/// Statements that can never execute inside an otherwise-live function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreachableBlock {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadCodeSummary {
    pub total_items: usize,
    pub dead_functions: usize,
    pub dead_classes: usize,
    pub dead_variables: usize,
    pub unreachable_blocks: usize,
    pub by_file: BTreeMap<String, usize>,
}

/// Full dead-code analysis report; items are ordered by (file, start_line).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadCodeReport {
    pub dead_functions: Vec<DeadItem>,
    pub dead_classes: Vec<DeadItem>,
    pub dead_variables: Vec<DeadItem>,
    pub unreachable_code: Vec<UnreachableBlock>,
    pub summary: DeadCodeSummary,
}

impl DeadCodeReport {
    pub fn iter_items(&self) -> impl Iterator<Item = &DeadItem> {
        self.dead_functions
            .iter()
            .chain(self.dead_classes.iter())
            .chain(self.dead_variables.iter())
    }
}
