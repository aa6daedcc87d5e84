//! Concatenation of several views with disjoint ids.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{IteratorError, IteratorResult};
use crate::types::Example;

use super::{BoxedView, DatasetView, ExampleIter};

/// Merged keys of several upstreams plus the owning upstream of each key.
pub(crate) struct KeyIndex {
    keys: Vec<String>,
    owners: HashMap<String, usize>,
}

impl KeyIndex {
    /// Collects keys in upstream order; fails with `DuplicateKey` if any id repeats.
    pub(crate) fn build(upstreams: &[BoxedView<'_>]) -> IteratorResult<Self> {
        let mut keys = Vec::new();
        let mut owners = HashMap::new();
        let mut duplicates = Vec::new();
        for (owner, upstream) in upstreams.iter().enumerate() {
            for key in upstream.keys()? {
                if owners.insert(key.clone(), owner).is_some() {
                    duplicates.push(key.clone());
                }
                keys.push(key);
            }
        }
        if !duplicates.is_empty() {
            duplicates.sort();
            duplicates.dedup();
            return Err(IteratorError::DuplicateKey { keys: duplicates });
        }
        Ok(Self { keys, owners })
    }

    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }

    pub(crate) fn owner(&self, key: &str) -> Option<usize> {
        self.owners.get(key).copied()
    }
}

/// Lazily built [`KeyIndex`]; errors are not cached, so a failing build is retried on next use.
pub(crate) fn cached_key_index<'c>(
    cell: &'c OnceLock<KeyIndex>,
    upstreams: &[BoxedView<'_>],
) -> IteratorResult<&'c KeyIndex> {
    if let Some(index) = cell.get() {
        return Ok(index);
    }
    let index = KeyIndex::build(upstreams)?;
    Ok(cell.get_or_init(|| index))
}

/// Iterates all upstreams back to back.
///
/// Every upstream must support `len` and `keys`. Uniqueness of ids across upstreams is checked on
/// first use of `keys` or `get_by_key`; purely positional access never builds the key lookup.
pub struct ConcatenateView<'a> {
    upstreams: Vec<BoxedView<'a>>,
    key_index: OnceLock<KeyIndex>,
}

impl<'a> ConcatenateView<'a> {
    pub fn new(upstreams: Vec<BoxedView<'a>>) -> Self {
        Self {
            upstreams,
            key_index: OnceLock::new(),
        }
    }
}

impl fmt::Debug for ConcatenateView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcatenateView")
            .field("upstreams", &self.upstreams.len())
            .field("keys_cached", &self.key_index.get().is_some())
            .finish()
    }
}

impl DatasetView for ConcatenateView<'_> {
    fn iter(&self) -> ExampleIter<'_> {
        Box::new(self.upstreams.iter().flat_map(|upstream| upstream.iter()))
    }

    fn len(&self) -> IteratorResult<usize> {
        self.upstreams.iter().map(|u| u.len()).sum()
    }

    fn keys(&self) -> IteratorResult<Vec<String>> {
        Ok(cached_key_index(&self.key_index, &self.upstreams)?
            .keys()
            .to_vec())
    }

    fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
        let owner = cached_key_index(&self.key_index, &self.upstreams)?
            .owner(key)
            .ok_or_else(|| IteratorError::key_not_found(key))?;
        self.upstreams[owner].get_by_key(key)
    }

    fn get_by_position(&self, position: usize) -> IteratorResult<Example> {
        let mut residual = position;
        let mut total = 0;
        for upstream in &self.upstreams {
            let n = upstream.len()?;
            if residual < n {
                return upstream.get_by_position(residual);
            }
            residual -= n;
            total += n;
        }
        Err(IteratorError::PositionOutOfRange {
            position,
            len: total,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::IteratorError;
    use crate::keys::EXAMPLE_ID;
    use crate::types::Value;
    use crate::view::DatasetView;
    use crate::view::test_support::source_of;

    #[test]
    fn concatenation_sums_lengths_and_chains_keys() {
        let view = source_of(&[("a", 1), ("b", 2)]).concatenate(vec![source_of(&[("c", 3)]).boxed()]);
        assert_eq!(view.len().unwrap(), 3);
        assert_eq!(view.keys().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(view.get_by_key("c").unwrap()["value"], Value::Int64(3));
    }

    #[test]
    fn positions_walk_across_upstreams() {
        let view = source_of(&[("a", 1), ("b", 2)])
            .concatenate(vec![source_of(&[]).boxed(), source_of(&[("c", 3), ("d", 4)]).boxed()]);
        let ids: Vec<_> = (0..4)
            .map(|i| view.get_by_position(i).unwrap()[EXAMPLE_ID].clone())
            .collect();
        assert_eq!(
            ids,
            vec![Value::from("a"), Value::from("b"), Value::from("c"), Value::from("d")]
        );
        assert!(matches!(
            view.get_by_position(4),
            Err(IteratorError::PositionOutOfRange { position: 4, len: 4 })
        ));
    }

    #[test]
    fn iteration_matches_positional_order() {
        let view = source_of(&[("a", 1)]).concatenate(vec![source_of(&[("b", 2)]).boxed()]);
        let iterated: Vec<_> = view.iter().map(|e| e.unwrap()).collect();
        let positional: Vec<_> = (0..2).map(|i| view.get_by_position(i).unwrap()).collect();
        assert_eq!(iterated, positional);
    }

    #[test]
    fn duplicate_ids_are_rejected_on_key_access() {
        let view = source_of(&[("a", 1), ("b", 2)]).concatenate(vec![source_of(&[("a", 3)]).boxed()]);
        // Positional access never needs the key set.
        assert!(view.get_by_position(2).is_ok());
        match view.keys() {
            Err(IteratorError::DuplicateKey { keys }) => assert_eq!(keys, vec!["a"]),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
        assert!(matches!(
            view.get_by_key("b"),
            Err(IteratorError::DuplicateKey { .. })
        ));
    }
}
