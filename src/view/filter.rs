//! Predicate filtering view.

use std::fmt;

use crate::error::{IteratorError, IteratorResult};
use crate::types::Example;

use super::{DatasetView, ExampleIter, ExamplePredicate};

const VIEW: &str = "FilterView";

/// Yields only upstream examples satisfying a predicate, in upstream order.
///
/// The number of survivors is unknown without evaluating every example, so `len`, `keys` and
/// positional access are unsupported. Key access checks the predicate for that one example.
/// Apply filters before expensive maps where possible.
pub struct FilterView<V, P> {
    upstream: V,
    predicate: P,
}

impl<V, P> FilterView<V, P>
where
    V: DatasetView,
    P: ExamplePredicate,
{
    pub fn new(upstream: V, predicate: P) -> Self {
        Self {
            upstream,
            predicate,
        }
    }
}

impl<V: fmt::Debug, P> fmt::Debug for FilterView<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterView")
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

impl<V, P> DatasetView for FilterView<V, P>
where
    V: DatasetView,
    P: ExamplePredicate,
{
    fn iter(&self) -> ExampleIter<'_> {
        Box::new(self.upstream.iter().filter_map(|example| {
            let example = match example {
                Ok(example) => example,
                Err(e) => return Some(Err(e)),
            };
            match self.predicate.test(&example) {
                Ok(true) => Some(Ok(example)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            }
        }))
    }

    fn len(&self) -> IteratorResult<usize> {
        Err(IteratorError::unsupported(VIEW, "len"))
    }

    fn keys(&self) -> IteratorResult<Vec<String>> {
        Err(IteratorError::unsupported(VIEW, "keys"))
    }

    fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
        let example = self.upstream.get_by_key(key)?;
        if self.predicate.test(&example)? {
            Ok(example)
        } else {
            Err(IteratorError::key_not_found(key))
        }
    }

    fn get_by_position(&self, _position: usize) -> IteratorResult<Example> {
        Err(IteratorError::unsupported(VIEW, "get_by_position"))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::IteratorError;
    use crate::keys::EXAMPLE_ID;
    use crate::types::{Example, Value};
    use crate::view::DatasetView;
    use crate::view::test_support::source_of;

    fn is_odd(ex: &Example) -> bool {
        matches!(ex.get("value"), Some(Value::Int64(v)) if v % 2 == 1)
    }

    #[test]
    fn iteration_keeps_only_matching_examples_in_order() {
        let filtered = source_of(&[("a", 1), ("b", 2), ("c", 3), ("d", 4)]).filter(is_odd);
        let ids: Vec<Value> = filtered
            .iter()
            .map(|e| e.unwrap()[EXAMPLE_ID].clone())
            .collect();
        assert_eq!(ids, vec![Value::from("a"), Value::from("c")]);
    }

    #[test]
    fn get_by_key_checks_the_predicate() {
        let filtered = source_of(&[("a", 1), ("b", 2)]).filter(is_odd);
        assert!(filtered.get_by_key("a").is_ok());
        assert!(matches!(
            filtered.get_by_key("b"),
            Err(IteratorError::KeyNotFound { .. })
        ));
        assert!(matches!(
            filtered.get_by_key("missing"),
            Err(IteratorError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn cardinality_and_positions_are_unsupported() {
        let filtered = source_of(&[("a", 1)]).filter(is_odd);
        assert!(matches!(filtered.len(), Err(IteratorError::Unsupported { .. })));
        assert!(matches!(filtered.keys(), Err(IteratorError::Unsupported { .. })));
        assert!(matches!(
            filtered.get_by_position(0),
            Err(IteratorError::Unsupported { .. })
        ));
        assert!(matches!(
            filtered.get_by_selection(0..1),
            Err(IteratorError::Unsupported { .. })
        ));
    }

    #[test]
    fn rejecting_everything_yields_an_empty_pass() {
        let filtered = source_of(&[("a", 1), ("b", 3)]).filter(|_: &Example| false);
        assert_eq!(filtered.iter().count(), 0);
    }
}
