//! Root view over an in-memory mapping of example id -> example body.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{IteratorError, IteratorResult};
use crate::keys::EXAMPLE_ID;
use crate::types::{Example, Map, Value};

use super::{DatasetView, ExampleIter};

/// Wraps a finite, ordered mapping from example id to example body.
///
/// The mapping order is the iteration order; it is not sorted here. Every read returns an owned
/// deep copy of the stored body with [`EXAMPLE_ID`] set to the key, so downstream transforms may
/// mutate what they receive.
#[derive(Clone)]
pub struct ExampleSource {
    examples: IndexMap<String, Map>,
    name: Option<String>,
}

impl ExampleSource {
    pub fn new(examples: IndexMap<String, Map>) -> Self {
        Self {
            examples,
            name: None,
        }
    }

    /// Attach a display name (typically the dataset name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn materialize(key: &str, body: &Map) -> Example {
        let mut example = body.clone();
        example.insert(EXAMPLE_ID.to_string(), Value::Utf8(key.to_string()));
        example
    }
}

impl fmt::Debug for ExampleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExampleSource")
            .field("name", &self.name)
            .field("len", &self.examples.len())
            .finish()
    }
}

impl DatasetView for ExampleSource {
    fn iter(&self) -> ExampleIter<'_> {
        Box::new(
            self.examples
                .iter()
                .map(|(key, body)| Ok(Self::materialize(key, body))),
        )
    }

    fn len(&self) -> IteratorResult<usize> {
        Ok(self.examples.len())
    }

    fn keys(&self) -> IteratorResult<Vec<String>> {
        Ok(self.examples.keys().cloned().collect())
    }

    fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
        self.examples
            .get(key)
            .map(|body| Self::materialize(key, body))
            .ok_or_else(|| IteratorError::key_not_found(key))
    }

    fn get_by_position(&self, position: usize) -> IteratorResult<Example> {
        self.examples
            .get_index(position)
            .map(|(key, body)| Self::materialize(key, body))
            .ok_or(IteratorError::PositionOutOfRange {
                position,
                len: self.examples.len(),
            })
    }
}
