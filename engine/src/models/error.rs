use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for the omen analysis engine.
///
/// Every variant maps onto a stable, serialization-friendly kind name via
/// [`EngineError::kind`]; external surfaces match on kinds, never on the
/// enum itself.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no source files to analyze")]
    NoSourceFiles,

    #[error("no git repository found at {path}")]
    NoGitRepository { path: PathBuf },

    #[error("invalid analysis period: {days} days")]
    InvalidPeriod { days: u32 },

    #[error("file too large: {path} ({size} bytes, limit {limit})")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("unsupported language: {path}")]
    UnsupportedLanguage { path: PathBuf },

    #[error("parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("configuration error: {key}: {reason}")]
    Config { key: String, reason: String },

    #[error("analysis cancelled")]
    Cancelled,

    #[error("analysis timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("ambiguous focus: {0}")]
    AmbiguousFocus(String),
}

impl EngineError {
    /// Stable kind name for the error surface.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NoSourceFiles => "no-source-files",
            EngineError::NoGitRepository { .. } | EngineError::Git(_) => "no-git-repository",
            EngineError::InvalidPeriod { .. } => "invalid-period",
            EngineError::FileTooLarge { .. } => "file-too-large",
            EngineError::UnsupportedLanguage { .. } => "unsupported-language",
            EngineError::Parse { .. } => "parse-error",
            EngineError::Io(_) => "io-error",
            EngineError::Config { .. } => "invalid-config",
            EngineError::Cancelled => "cancelled",
            EngineError::Timeout { .. } => "timeout",
            EngineError::AmbiguousFocus(_) => "ambiguous-focus",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(EngineError::NoSourceFiles.kind(), "no-source-files");
        assert_eq!(
            EngineError::NoGitRepository {
                path: PathBuf::from("/tmp/x")
            }
            .kind(),
            "no-git-repository"
        );
        assert_eq!(EngineError::InvalidPeriod { days: 0 }.kind(), "invalid-period");
        assert_eq!(EngineError::Cancelled.kind(), "cancelled");
        assert_eq!(EngineError::Timeout { seconds: 300 }.kind(), "timeout");
    }

    #[test]
    fn test_file_too_large_carries_path_and_limit() {
        let err = EngineError::FileTooLarge {
            path: PathBuf::from("big.rs"),
            size: 2_000_000,
            limit: 1_000_000,
        };
        assert_eq!(err.kind(), "file-too-large");
        assert!(err.to_string().contains("big.rs"));
        assert!(err.to_string().contains("2000000"));
    }
}
