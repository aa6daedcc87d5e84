//! Per-example transformation view.

use std::fmt;

use crate::error::IteratorResult;
use crate::types::Example;

use super::{DatasetView, ExampleIter, ExampleTransform};

/// Applies a transform to every example pulled from the upstream view.
///
/// Keys and length are those of the upstream: a transform must not change cardinality.
pub struct MapView<V, F> {
    upstream: V,
    transform: F,
}

impl<V, F> MapView<V, F>
where
    V: DatasetView,
    F: ExampleTransform,
{
    pub fn new(upstream: V, transform: F) -> Self {
        Self {
            upstream,
            transform,
        }
    }
}

impl<V: fmt::Debug, F> fmt::Debug for MapView<V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapView")
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

impl<V, F> DatasetView for MapView<V, F>
where
    V: DatasetView,
    F: ExampleTransform,
{
    fn iter(&self) -> ExampleIter<'_> {
        Box::new(
            self.upstream
                .iter()
                .map(|example| self.transform.apply(example?)),
        )
    }

    fn len(&self) -> IteratorResult<usize> {
        self.upstream.len()
    }

    fn keys(&self) -> IteratorResult<Vec<String>> {
        self.upstream.keys()
    }

    fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
        self.transform.apply(self.upstream.get_by_key(key)?)
    }

    fn get_by_position(&self, position: usize) -> IteratorResult<Example> {
        self.transform.apply(self.upstream.get_by_position(position)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{IteratorError, IteratorResult};
    use crate::types::{Example, Value};
    use crate::view::DatasetView;
    use crate::view::test_support::source_of;

    fn double(mut ex: Example) -> IteratorResult<Example> {
        if let Some(Value::Int64(v)) = ex.get("value").cloned() {
            ex.insert("value".to_string(), Value::Int64(v * 2));
        }
        Ok(ex)
    }

    #[test]
    fn map_preserves_keys_len_and_order() {
        let src = source_of(&[("a", 1), ("b", 2), ("c", 3)]);
        let keys = src.keys().unwrap();
        let mapped = src.map(double);

        assert_eq!(mapped.len().unwrap(), 3);
        assert_eq!(mapped.keys().unwrap(), keys);
        let values: Vec<Value> = mapped.iter().map(|e| e.unwrap()["value"].clone()).collect();
        assert_eq!(values, vec![Value::Int64(2), Value::Int64(4), Value::Int64(6)]);
    }

    #[test]
    fn map_applies_on_key_and_position_access() {
        let mapped = source_of(&[("a", 1), ("b", 2)]).map(double);
        assert_eq!(mapped.get_by_key("b").unwrap()["value"], Value::Int64(4));
        assert_eq!(mapped.get_by_position(0).unwrap()["value"], Value::Int64(2));
    }

    #[test]
    fn in_place_mutation_does_not_touch_upstream() {
        let src = source_of(&[("a", 1)]);
        {
            let mapped = (&src).map(|mut ex: Example| -> IteratorResult<Example> {
                ex.clear();
                Ok(ex)
            });
            assert!(mapped.get_by_key("a").unwrap().is_empty());
        }
        assert_eq!(src.get_by_key("a").unwrap()["value"], Value::Int64(1));
    }

    #[test]
    fn transform_errors_surface_per_example() {
        let mapped = source_of(&[("a", 1), ("b", 2)]).map(|ex: Example| -> IteratorResult<Example> {
            if ex["value"] == Value::Int64(2) {
                return Err(IteratorError::configuration("boom"));
            }
            Ok(ex)
        });
        let results: Vec<_> = mapped.iter().collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
