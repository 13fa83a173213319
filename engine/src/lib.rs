//! Omen analysis engine.
//!
//! A multi-language static analysis engine that computes health, risk, and
//! debt metrics for source repositories: function-level complexity, dead code
//! with confidence scores, dependency-graph metrics, self-admitted technical
//! debt, change-risk prediction, and a composite weighted health score.
//!
//! The engine operates on syntactic information only (tree-sitter parse
//! trees), optionally augmented by version-control history supplied through
//! the [`services::vcs::Repository`] trait. It never executes analyzed code
//! and does not require compilable projects; results are advisory heuristics.

pub mod models;
pub mod services;
pub mod utils;

pub use models::config::EngineConfig;
pub use models::error::EngineError;
pub use models::syntax::Language;

pub use services::change_risk::ChangeRiskAnalyzer;
pub use services::complexity::ComplexityAnalyzer;
pub use services::dead_code_analyzer::DeadCodeAnalyzer;
pub use services::satd_detector::SatdDetector;
pub use services::scorer::CompositeScorer;
pub use services::tdg_calculator::TdgCalculator;
