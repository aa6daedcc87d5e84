//! Reserved example field names.

/// Unique id of an example, injected by [`crate::view::ExampleSource`].
pub const EXAMPLE_ID: &str = "example_id";
/// Top-level key of a database description file.
pub const DATASETS: &str = "datasets";
/// Sub-structure holding audio file paths.
pub const AUDIO_PATH: &str = "audio_path";
/// Default destination of decoded audio.
pub const AUDIO_DATA: &str = "audio_data";
/// Observed (recorded) signal modality.
pub const OBSERVATION: &str = "observation";
/// Number of samples, either a number or a per-modality mapping.
pub const NUM_SAMPLES: &str = "num_samples";
/// Frame-level alignment sequence.
pub const ALIGNMENT: &str = "alignment";
/// Length of [`ALIGNMENT`].
pub const NUM_ALIGNMENT_FRAMES: &str = "num_alignment_frames";
pub const TRANSCRIPTION: &str = "transcription";
pub const KALDI_TRANSCRIPTION: &str = "kaldi_transcription";
/// Suffix appended to a transcription field for its word-id sequence.
pub const IDS_SUFFIX: &str = "_ids";
