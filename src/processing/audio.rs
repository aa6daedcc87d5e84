//! Audio enrichment: replaces file paths by decoded signals.

use std::fmt;
use std::path::Path;

#[cfg(feature = "wav")]
use ndarray::{Array1, Array2};
use ndarray::ArrayD;

use crate::error::{IteratorError, IteratorResult};
use crate::keys::{AUDIO_DATA, AUDIO_PATH, OBSERVATION};
use crate::types::{ArrayValue, Example, Map, Value};
use crate::view::ExampleTransform;

use super::example_id;
use super::recursive::recursive_transform;

/// Reads one audio file into its primary signal.
pub type LeafReader = fn(&Path) -> IteratorResult<ArrayD<f64>>;

/// Which paths an [`AudioReader`] reads and where it stores the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioReaderOptions {
    /// Example field holding the (nested) audio paths.
    pub src_key: String,
    /// Field receiving the decoded audio; `None` merges the decoded sub-structures into the
    /// example itself.
    pub dst_key: Option<String>,
    /// Sub-keys of `src_key` to read; `None` reads everything under `src_key`.
    pub audio_keys: Option<Vec<String>>,
}

impl Default for AudioReaderOptions {
    fn default() -> Self {
        Self {
            src_key: AUDIO_PATH.to_string(),
            dst_key: Some(AUDIO_DATA.to_string()),
            audio_keys: Some(vec![OBSERVATION.to_string()]),
        }
    }
}

/// Reads audio files referenced by an example and attaches the signals.
///
/// Paths may be single strings, lists (stacked into one array by list position) or maps (kept as
/// maps of arrays, e.g. for arrays with missing channels). Restricting `audio_keys` avoids reading
/// files that are not needed.
pub struct AudioReader<R = LeafReader> {
    options: AudioReaderOptions,
    read_fn: R,
}

#[cfg(feature = "wav")]
impl AudioReader<LeafReader> {
    /// Reader using [`read_wav`] for every leaf.
    pub fn new(options: AudioReaderOptions) -> Self {
        Self {
            options,
            read_fn: read_wav,
        }
    }
}

impl<R> AudioReader<R>
where
    R: Fn(&Path) -> IteratorResult<ArrayD<f64>>,
{
    pub fn with_read_fn(options: AudioReaderOptions, read_fn: R) -> Self {
        Self { options, read_fn }
    }

    pub fn options(&self) -> &AudioReaderOptions {
        &self.options
    }

    fn read_leaf(&self, leaf: &Value) -> IteratorResult<Value> {
        let path = leaf.as_str().ok_or_else(|| IteratorError::TypeMismatch {
            field: self.options.src_key.clone(),
            expected: "audio path string",
            found: leaf.type_name(),
        })?;
        Ok(Value::Array(ArrayValue::Float((self.read_fn)(Path::new(path))?)))
    }

    fn read_tree(&self, paths: &Value) -> IteratorResult<Value> {
        recursive_transform(|leaf: &Value| self.read_leaf(leaf), paths, true)
    }
}

impl<R> fmt::Debug for AudioReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioReader")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R> ExampleTransform for AudioReader<R>
where
    R: Fn(&Path) -> IteratorResult<ArrayD<f64>>,
{
    fn apply(&self, mut example: Example) -> IteratorResult<Example> {
        let src_key = &self.options.src_key;
        let src = example
            .get(src_key)
            .ok_or_else(|| IteratorError::MissingField {
                example_id: example_id(&example),
                field: src_key.clone(),
            })?;

        let data = match &self.options.audio_keys {
            Some(audio_keys) => {
                let src_map = src.as_map().ok_or_else(|| IteratorError::TypeMismatch {
                    field: src_key.clone(),
                    expected: "map",
                    found: src.type_name(),
                })?;
                let mut data = Map::new();
                for key in audio_keys {
                    let paths = src_map.get(key).ok_or_else(|| IteratorError::MissingField {
                        example_id: example_id(&example),
                        field: format!("{src_key}.{key}"),
                    })?;
                    data.insert(key.clone(), self.read_tree(paths)?);
                }
                Value::Map(data)
            }
            None => self.read_tree(src)?,
        };

        match &self.options.dst_key {
            Some(dst_key) => {
                example.insert(dst_key.clone(), data);
            }
            None => match data {
                Value::Map(data) => example.extend(data),
                other => {
                    return Err(IteratorError::TypeMismatch {
                        field: src_key.clone(),
                        expected: "map",
                        found: other.type_name(),
                    });
                }
            },
        }
        Ok(example)
    }
}

/// Reads a WAV file as `f64` samples in `[-1, 1]`.
///
/// Mono files give shape `[frames]`, multi-channel files `[channels, frames]`. The sample rate
/// and other header data are discarded. The file is closed before returning.
#[cfg(feature = "wav")]
pub fn read_wav(path: &Path) -> IteratorResult<ArrayD<f64>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = usize::from(spec.channels);
    if channels <= 1 {
        return Ok(Array1::from(samples).into_dyn());
    }
    let frames = samples.len() / channels;
    let interleaved = Array2::from_shape_vec((frames, channels), samples)?;
    Ok(interleaved
        .reversed_axes()
        .as_standard_layout()
        .into_owned()
        .into_dyn())
}
