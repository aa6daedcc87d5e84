//! Frame-level alignments: loading, attaching to examples, and consistency checks.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::{IteratorError, IteratorResult};
use crate::keys::{ALIGNMENT, EXAMPLE_ID, NUM_ALIGNMENT_FRAMES, NUM_SAMPLES, OBSERVATION};
use crate::observability::{
    PipelineEvent, PipelineObserver, PipelineSeverity, RejectReason, noop_observer,
};
use crate::types::{ArrayValue, Example, Value};
use crate::view::{ExamplePredicate, ExampleTransform};

/// Utterance id -> frame-level class ids.
pub type Alignments = HashMap<String, Vec<i64>>;

type Loader = Box<dyn Fn(&Path) -> IteratorResult<Alignments> + Send + Sync>;
type IdMap = Box<dyn Fn(&Example) -> Option<String> + Send + Sync>;

/// Reads a Kaldi text int-vector file: one `<utt-id> <int> <int> ...` record per line.
///
/// Blank lines are skipped. A later record for the same id replaces an earlier one.
pub fn read_text_alignments(path: &Path) -> IteratorResult<Alignments> {
    let text = fs::read_to_string(path)?;
    parse_text_alignments(&text, path)
}

fn parse_text_alignments(text: &str, path: &Path) -> IteratorResult<Alignments> {
    let mut alignments = Alignments::new();
    for (idx, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        let Some(id) = tokens.next() else {
            continue;
        };
        let values = tokens
            .map(|token| {
                token.parse::<i64>().map_err(|e| IteratorError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: format!("invalid integer '{token}': {e}"),
                })
            })
            .collect::<IteratorResult<Vec<_>>>()?;
        alignments.insert(id.to_string(), values);
    }
    Ok(alignments)
}

/// Where an [`AlignmentReader`] gets its mapping from.
///
/// A pre-supplied mapping takes precedence over the path.
#[derive(Debug, Clone, Default)]
pub struct AlignmentReaderOptions {
    pub alignment_path: Option<PathBuf>,
    pub alignments: Option<Alignments>,
}

/// Attaches `alignment` and `num_alignment_frames` to examples.
///
/// The mapping is loaded on first use (or by an explicit [`AlignmentReader::ensure_loaded`]) and
/// at most once, also under concurrent first use. Examples without an alignment pass through
/// unchanged and are reported to the observer as [`PipelineEvent::AlignmentMissing`].
pub struct AlignmentReader {
    alignment_path: Option<PathBuf>,
    preloaded: Mutex<Option<Alignments>>,
    alignments: OnceLock<Alignments>,
    loader: Loader,
    id_map: IdMap,
    observer: Arc<dyn PipelineObserver>,
}

impl AlignmentReader {
    /// Fails with a configuration error if neither a path nor a mapping is given.
    pub fn new(options: AlignmentReaderOptions) -> IteratorResult<Self> {
        if options.alignment_path.is_none() && options.alignments.is_none() {
            return Err(IteratorError::configuration(
                "alignment reader needs an alignment path or a pre-supplied mapping",
            ));
        }
        Ok(Self::build(options.alignment_path, options.alignments))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::build(Some(path.into()), None)
    }

    pub fn from_alignments(alignments: Alignments) -> Self {
        Self::build(None, Some(alignments))
    }

    fn build(alignment_path: Option<PathBuf>, alignments: Option<Alignments>) -> Self {
        Self {
            alignment_path,
            preloaded: Mutex::new(alignments),
            alignments: OnceLock::new(),
            loader: Box::new(read_text_alignments),
            id_map: Box::new(stored_id),
            observer: noop_observer(),
        }
    }

    /// Maps an example to the id used for the lookup (default: its `example_id`).
    pub fn with_id_map<F>(mut self, id_map: F) -> Self
    where
        F: Fn(&Example) -> Option<String> + Send + Sync + 'static,
    {
        self.id_map = Box::new(id_map);
        self
    }

    /// Replaces the file loader (default: [`read_text_alignments`]).
    pub fn with_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Path) -> IteratorResult<Alignments> + Send + Sync + 'static,
    {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Loads the mapping unless already loaded. A failed load is retried on the next call.
    pub fn ensure_loaded(&self) -> IteratorResult<&Alignments> {
        if let Some(alignments) = self.alignments.get() {
            return Ok(alignments);
        }
        let mut preloaded = self
            .preloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(alignments) = self.alignments.get() {
            return Ok(alignments);
        }

        let (alignments, path) = match preloaded.take() {
            Some(alignments) => (alignments, None),
            None => {
                let path = self.alignment_path.as_deref().ok_or_else(|| {
                    IteratorError::configuration("alignment reader has no alignment path")
                })?;
                ((self.loader)(path)?, Some(path.to_path_buf()))
            }
        };
        self.observer.on_event(
            PipelineSeverity::Debug,
            &PipelineEvent::AlignmentsLoaded {
                path,
                count: alignments.len(),
            },
        );
        Ok(self.alignments.get_or_init(|| alignments))
    }
}

impl fmt::Debug for AlignmentReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentReader")
            .field("alignment_path", &self.alignment_path)
            .field("loaded", &self.alignments.get().map(HashMap::len))
            .finish_non_exhaustive()
    }
}

impl ExampleTransform for AlignmentReader {
    fn apply(&self, mut example: Example) -> IteratorResult<Example> {
        let alignments = self.ensure_loaded()?;
        let lookup_id = (self.id_map)(&example);
        match lookup_id.as_deref().and_then(|id| alignments.get(id)) {
            Some(alignment) => {
                example.insert(
                    NUM_ALIGNMENT_FRAMES.to_string(),
                    Value::Int64(alignment.len() as i64),
                );
                example.insert(
                    ALIGNMENT.to_string(),
                    Value::Array(ArrayValue::int_vector(alignment.clone())),
                );
            }
            None => self.observer.on_event(
                PipelineSeverity::Warning,
                &PipelineEvent::AlignmentMissing {
                    example_id: stored_id(&example),
                    lookup_id,
                },
            ),
        }
        Ok(example)
    }
}

fn stored_id(example: &Example) -> Option<String> {
    example
        .get(EXAMPLE_ID)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Frames of a 400-sample window with 160-sample shift: `floor((n - 240) / 160)`.
pub fn frames_for_samples(num_samples: i64) -> i64 {
    num_samples.saturating_sub(240).div_euclid(160)
}

/// Frame count after low-frame-rate stacking of three frames, rounding up.
pub fn lfr_frames(num_frames: i64) -> i64 {
    (num_frames + (-num_frames).rem_euclid(3)).div_euclid(3)
}

/// Keeps examples whose alignment is present, non-empty and consistent with `num_samples`.
///
/// `num_samples` may be a number or a per-modality map, read at `modality` (default
/// `observation`). The alignment length must equal either the full frame count or the
/// low-frame-rate frame count. Examples without `num_samples` are accepted.
pub struct AlignmentValidity {
    modality: String,
    observer: Arc<dyn PipelineObserver>,
}

impl Default for AlignmentValidity {
    fn default() -> Self {
        Self {
            modality: OBSERVATION.to_string(),
            observer: noop_observer(),
        }
    }
}

impl AlignmentValidity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_modality(mut self, modality: impl Into<String>) -> Self {
        self.modality = modality.into();
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn reject(&self, example: &Example, reason: RejectReason) -> IteratorResult<bool> {
        self.observer.on_event(
            PipelineSeverity::Warning,
            &PipelineEvent::AlignmentRejected {
                example_id: stored_id(example),
                reason,
            },
        );
        Ok(false)
    }

    fn num_samples(&self, example: &Example) -> IteratorResult<Option<i64>> {
        let value = match example.get(NUM_SAMPLES) {
            None => return Ok(None),
            Some(Value::Map(per_modality)) => {
                per_modality
                    .get(&self.modality)
                    .ok_or_else(|| IteratorError::MissingField {
                        example_id: super::example_id(example),
                        field: format!("{NUM_SAMPLES}.{}", self.modality),
                    })?
            }
            Some(value) => value,
        };
        value
            .as_i64()
            .map(Some)
            .ok_or_else(|| IteratorError::TypeMismatch {
                field: NUM_SAMPLES.to_string(),
                expected: "integer",
                found: value.type_name(),
            })
    }
}

impl fmt::Debug for AlignmentValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignmentValidity")
            .field("modality", &self.modality)
            .finish_non_exhaustive()
    }
}

impl ExamplePredicate for AlignmentValidity {
    fn test(&self, example: &Example) -> IteratorResult<bool> {
        let alignment_frames = match example.get(ALIGNMENT).and_then(Value::sequence_len) {
            Some(n) if n > 0 => n,
            _ => return self.reject(example, RejectReason::MissingAlignment),
        };
        let Some(num_samples) = self.num_samples(example)? else {
            return Ok(true);
        };

        let expected_frames = frames_for_samples(num_samples);
        let expected_lfr_frames = lfr_frames(expected_frames);
        let n = alignment_frames as i64;
        if n == expected_frames || n == expected_lfr_frames {
            Ok(true)
        } else {
            self.reject(
                example,
                RejectReason::FrameMismatch {
                    alignment_frames,
                    expected_frames,
                    expected_lfr_frames,
                },
            )
        }
    }
}
