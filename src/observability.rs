//! Observer hooks for pipeline events.
//!
//! Components that report per-example anomalies (the alignment reader and the alignment validity
//! predicate) take an injected [`PipelineObserver`]. The default is [`NoopObserver`]; attach a
//! [`StdErrObserver`], [`FileObserver`] or [`CompositeObserver`] to record events.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity classification for observer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineSeverity {
    /// Diagnostic detail (e.g. how many alignments were loaded).
    Debug,
    /// Informational event.
    Info,
    /// Non-fatal per-example anomaly.
    Warning,
}

/// Why the alignment validity predicate rejected an example.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No alignment field, or an empty one.
    MissingAlignment,
    /// Alignment length matches neither the full nor the low-frame-rate frame count.
    FrameMismatch {
        alignment_frames: usize,
        expected_frames: i64,
        expected_lfr_frames: i64,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAlignment => write!(f, "no alignment"),
            Self::FrameMismatch {
                alignment_frames,
                expected_frames,
                expected_lfr_frames,
            } => write!(
                f,
                "alignment has {alignment_frames} frames but the observation has {expected_frames} [{expected_lfr_frames}] frames"
            ),
        }
    }
}

/// Events emitted by enrichers.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The alignment mapping was loaded (once per reader).
    AlignmentsLoaded {
        path: Option<PathBuf>,
        count: usize,
    },
    /// No alignment exists for the example; it passes through unchanged.
    AlignmentMissing {
        example_id: Option<String>,
        lookup_id: Option<String>,
    },
    /// An example was filtered out by the alignment validity predicate.
    AlignmentRejected {
        example_id: Option<String>,
        reason: RejectReason,
    },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlignmentsLoaded { path, count } => match path {
                Some(p) => write!(f, "read {count} alignments from path {}", p.display()),
                None => write!(f, "using {count} preloaded alignments"),
            },
            Self::AlignmentMissing {
                example_id,
                lookup_id,
            } => write!(
                f,
                "no alignment found for example id {} (mapped: {})",
                example_id.as_deref().unwrap_or("<none>"),
                lookup_id.as_deref().unwrap_or("<none>")
            ),
            Self::AlignmentRejected { example_id, reason } => write!(
                f,
                "example {} rejected: {reason}",
                example_id.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

/// Observer interface for pipeline events.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, _severity: PipelineSeverity, _event: &PipelineEvent) {}
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Shared handle to the default no-op observer.
pub fn noop_observer() -> Arc<dyn PipelineObserver> {
    Arc::new(NoopObserver)
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_event(&self, severity: PipelineSeverity, event: &PipelineEvent) {
        for o in &self.observers {
            o.on_event(severity, event);
        }
    }
}

/// Logs events at or above `min_severity` to stderr.
#[derive(Debug, Clone, Copy)]
pub struct StdErrObserver {
    pub min_severity: PipelineSeverity,
}

impl Default for StdErrObserver {
    fn default() -> Self {
        Self {
            min_severity: PipelineSeverity::Warning,
        }
    }
}

impl PipelineObserver for StdErrObserver {
    fn on_event(&self, severity: PipelineSeverity, event: &PipelineEvent) {
        if severity >= self.min_severity {
            eprintln!("[database][{severity:?}] {event}");
        }
    }
}

/// Appends events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_event(&self, severity: PipelineSeverity, event: &PipelineEvent) {
        self.append_line(&format!("{} {severity:?} {event}", unix_ts()));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording(Mutex<Vec<PipelineSeverity>>);

    impl PipelineObserver for Recording {
        fn on_event(&self, severity: PipelineSeverity, _event: &PipelineEvent) {
            self.0.lock().unwrap().push(severity);
        }
    }

    #[test]
    fn composite_fans_out_to_every_observer() {
        let a = Arc::new(Recording::default());
        let b = Arc::new(Recording::default());
        let composite = CompositeObserver::new(vec![a.clone(), b.clone()]);
        let event = PipelineEvent::AlignmentsLoaded {
            path: None,
            count: 2,
        };
        composite.on_event(PipelineSeverity::Debug, &event);
        assert_eq!(*a.0.lock().unwrap(), vec![PipelineSeverity::Debug]);
        assert_eq!(*b.0.lock().unwrap(), vec![PipelineSeverity::Debug]);
    }

    #[test]
    fn file_observer_appends_lines() {
        let path = std::env::temp_dir().join(format!(
            "rust_dataset_iterator_observer_{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let obs = FileObserver::new(&path);
        let event = PipelineEvent::AlignmentMissing {
            example_id: Some("a".to_string()),
            lookup_id: Some("a".to_string()),
        };
        obs.on_event(PipelineSeverity::Warning, &event);
        obs.on_event(PipelineSeverity::Warning, &event);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("no alignment found for example id a"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reject_reason_display_names_both_frame_counts() {
        let reason = RejectReason::FrameMismatch {
            alignment_frames: 7,
            expected_frames: 10,
            expected_lfr_frames: 4,
        };
        assert_eq!(
            reason.to_string(),
            "alignment has 7 frames but the observation has 10 [4] frames"
        );
    }
}
