use std::fmt;

use crate::error::{IteratorError, IteratorResult};
use crate::keys::{IDS_SUFFIX, KALDI_TRANSCRIPTION, TRANSCRIPTION};
use crate::types::{ArrayValue, Example, Value};
use crate::view::ExampleTransform;

use super::recursive::recursive_transform;

/// Converts whitespace-tokenized transcriptions into word-id arrays.
///
/// `transcription` and `kaldi_transcription` are handled independently; each present field gets a
/// sibling `<field>_ids` with the same nesting and a 1-d int array per string. Absent fields are
/// skipped.
pub struct Word2Id<F> {
    word2id: F,
}

impl<F> Word2Id<F>
where
    F: Fn(&str) -> i64,
{
    pub fn new(word2id: F) -> Self {
        Self { word2id }
    }

    fn encode(&self, field: &str, leaf: &Value) -> IteratorResult<Value> {
        match leaf {
            Value::Utf8(text) => {
                let ids = text.split_whitespace().map(|w| (self.word2id)(w)).collect();
                Ok(Value::Array(ArrayValue::int_vector(ids)))
            }
            other => Err(IteratorError::TypeMismatch {
                field: field.to_string(),
                expected: "string",
                found: other.type_name(),
            }),
        }
    }
}

impl<F> fmt::Debug for Word2Id<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Word2Id").finish_non_exhaustive()
    }
}

impl<F> ExampleTransform for Word2Id<F>
where
    F: Fn(&str) -> i64,
{
    fn apply(&self, mut example: Example) -> IteratorResult<Example> {
        for field in [TRANSCRIPTION, KALDI_TRANSCRIPTION] {
            let Some(value) = example.get(field) else {
                continue;
            };
            let ids = recursive_transform(|leaf: &Value| self.encode(field, leaf), value, false)?;
            example.insert(format!("{field}{IDS_SUFFIX}"), ids);
        }
        Ok(example)
    }
}
