//! Parallel per-file fan-out.
//!
//! A bounded worker pool sized to hardware parallelism drains the input
//! list. Each worker owns a long-lived [`SourceParser`] so grammar
//! initialization is amortized across its files, parses once, and runs the
//! caller's analyzer chain on the tree. Results land at their input index,
//! so the returned sequence matches input order regardless of completion
//! order. The pool is single-use and terminates when the inputs drain.

use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::models::error::EngineError;
use crate::models::syntax::ParsedFile;
use crate::services::parser::SourceParser;
use crate::services::progress::ProgressSink;
use crate::utils::cancel::CancellationToken;

#[derive(Default)]
pub struct FileProcessorOptions {
    /// Per-file byte limit; 0 means unlimited. Oversized files are skipped
    /// with a `file-too-large` error in their result slot.
    pub max_file_size: u64,
    pub cancel: CancellationToken,
    pub progress: Option<Arc<dyn ProgressSink>>,
}

pub struct ProcessOutcome<T> {
    /// Same order as the input path list.
    pub results: Vec<Result<T, EngineError>>,
    pub cancelled: bool,
}

/// Run `analyze` over every path in parallel.
///
/// The cancellation token is polled at each work-item boundary; in-flight
/// parses run to completion. On cancellation, slots not yet processed carry
/// a `cancelled` error and the outcome is flagged.
pub fn process_files<T, F>(
    paths: &[PathBuf],
    options: &FileProcessorOptions,
    analyze: F,
) -> ProcessOutcome<T>
where
    T: Send,
    F: Fn(&ParsedFile) -> Result<T, EngineError> + Send + Sync,
{
    let total = paths.len();
    if total == 0 {
        return ProcessOutcome {
            results: Vec::new(),
            cancelled: options.cancel.is_cancelled(),
        };
    }

    let workers = num_cpus::get().min(total).max(1);
    debug!(files = total, workers, "processing files");

    let (sender, receiver) = crossbeam_channel::unbounded::<(usize, PathBuf)>();
    for (idx, path) in paths.iter().enumerate() {
        sender.send((idx, path.clone())).expect("channel open");
    }
    drop(sender);

    let slots: Mutex<Vec<Option<Result<T, EngineError>>>> =
        Mutex::new((0..total).map(|_| None).collect());
    let completed = AtomicUsize::new(0);
    let analyze = &analyze;
    let slots_ref = &slots;
    let completed_ref = &completed;

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let receiver = receiver.clone();
            let cancel = options.cancel.clone();
            let progress = options.progress.clone();
            let max_file_size = options.max_file_size;

            scope.spawn(move || {
                let mut parser = SourceParser::new();
                while let Ok((idx, path)) = receiver.recv() {
                    if cancel.is_cancelled() {
                        break;
                    }

                    let result = process_one(&mut parser, &path, max_file_size, analyze);
                    slots_ref.lock()[idx] = Some(result);

                    let done = completed_ref.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(sink) = &progress {
                        sink.tick(done, total, &path.to_string_lossy());
                    }
                }
            });
        }
    });

    let cancelled = options.cancel.is_cancelled();
    let results = slots
        .into_inner()
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(EngineError::Cancelled)))
        .collect();

    ProcessOutcome { results, cancelled }
}

fn process_one<T, F>(
    parser: &mut SourceParser,
    path: &PathBuf,
    max_file_size: u64,
    analyze: &F,
) -> Result<T, EngineError>
where
    F: Fn(&ParsedFile) -> Result<T, EngineError>,
{
    if max_file_size > 0 {
        let size = std::fs::metadata(path)?.len();
        if size > max_file_size {
            return Err(EngineError::FileTooLarge {
                path: path.clone(),
                size,
                limit: max_file_size,
            });
        }
    }

    let parsed = parser.parse_path(path)?;

    // A pathological file must not sink the whole run: panics inside the
    // analyzer chain are confined to this file's result slot.
    match catch_unwind(AssertUnwindSafe(|| analyze(&parsed))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "analyzer panicked".to_string());
            Err(EngineError::Parse {
                file: path.clone(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_files(dir: &TempDir, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files
            .iter()
            .map(|(name, content)| {
                let path = dir.path().join(name);
                let mut f = std::fs::File::create(&path).unwrap();
                f.write_all(content.as_bytes()).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_results_match_input_order() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(
            &dir,
            &[
                ("a.go", "package a\nfunc A() {}\n"),
                ("b.go", "package b\nfunc B() {}\nfunc B2() {}\n"),
                ("c.go", "package c\n"),
            ],
        );

        let outcome = process_files(&paths, &FileProcessorOptions::default(), |parsed| {
            Ok(parsed.path.file_name().unwrap().to_string_lossy().to_string())
        });

        assert!(!outcome.cancelled);
        let names: Vec<_> = outcome.results.iter().map(|r| r.as_ref().unwrap().as_str()).collect();
        assert_eq!(names, vec!["a.go", "b.go", "c.go"]);
    }

    #[test]
    fn test_empty_input_is_empty_report() {
        let outcome = process_files(&[], &FileProcessorOptions::default(), |_| Ok(()));
        assert!(outcome.results.is_empty());
        assert!(!outcome.cancelled);
    }

    #[test]
    fn test_oversized_file_skipped_others_proceed() {
        let dir = TempDir::new().unwrap();
        let big_body = format!("package big\n// {}\n", "x".repeat(4096));
        let paths = write_files(
            &dir,
            &[("big.go", big_body.as_str()), ("small.go", "package small\n")],
        );

        let options = FileProcessorOptions {
            max_file_size: 64,
            ..Default::default()
        };
        let outcome = process_files(&paths, &options, |_| Ok(()));

        assert_eq!(outcome.results[0].as_ref().unwrap_err().kind(), "file-too-large");
        assert!(outcome.results[1].is_ok());
    }

    #[test]
    fn test_cancellation_before_work_yields_cancelled_slots() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, &[("a.go", "package a\n"), ("b.go", "package b\n")]);

        let options = FileProcessorOptions::default();
        options.cancel.cancel();
        let outcome = process_files(&paths, &options, |_| Ok(()));

        assert!(outcome.cancelled);
        for result in &outcome.results {
            assert_eq!(result.as_ref().unwrap_err().kind(), "cancelled");
        }
    }

    #[test]
    fn test_analyzer_panic_confined_to_slot() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, &[("a.go", "package a\n"), ("b.go", "package b\n")]);

        let outcome = process_files(&paths, &FileProcessorOptions::default(), |parsed| {
            if parsed.path.file_name().unwrap() == "a.go" {
                panic!("pathological file");
            }
            Ok(())
        });

        assert!(outcome.results[0].is_err());
        assert!(outcome.results[1].is_ok());
    }

    #[test]
    fn test_unsupported_extension_occupies_slot() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, &[("data.bin", "not source"), ("ok.go", "package ok\n")]);

        let outcome = process_files(&paths, &FileProcessorOptions::default(), |_| Ok(()));
        assert_eq!(
            outcome.results[0].as_ref().unwrap_err().kind(),
            "unsupported-language"
        );
        assert!(outcome.results[1].is_ok());
    }

    #[test]
    fn test_progress_ticks_reach_total() {
        use crate::services::progress::ProgressSink;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counter(AtomicUsize);
        impl ProgressSink for Counter {
            fn tick(&self, _c: usize, _t: usize, _l: &str) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, &[("a.go", "package a\n"), ("b.go", "package b\n")]);
        let counter = Arc::new(Counter(AtomicUsize::new(0)));

        let options = FileProcessorOptions {
            progress: Some(counter.clone()),
            ..Default::default()
        };
        process_files(&paths, &options, |_| Ok(()));

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
