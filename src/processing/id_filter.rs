use std::collections::HashSet;

use crate::error::{IteratorError, IteratorResult};
use crate::keys::EXAMPLE_ID;
use crate::types::{Example, Value};
use crate::view::ExamplePredicate;

/// Keeps examples whose `example_id` is in an allow-list.
#[derive(Debug, Clone, Default)]
pub struct IdFilter {
    ids: HashSet<String>,
}

impl IdFilter {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl ExamplePredicate for IdFilter {
    fn test(&self, example: &Example) -> IteratorResult<bool> {
        let id = example
            .get(EXAMPLE_ID)
            .and_then(Value::as_str)
            .ok_or_else(|| IteratorError::MissingField {
                example_id: super::example_id(example),
                field: EXAMPLE_ID.to_string(),
            })?;
        Ok(self.ids.contains(id))
    }
}
