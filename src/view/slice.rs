//! Subset view selected by range, positions or keys.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use indexmap::IndexSet;

use crate::error::{IteratorError, IteratorResult};
use crate::types::Example;

use super::{DatasetView, ExampleIter, Selection};

/// Restricts an upstream view with known length to a resolved list of upstream positions.
///
/// The selection is resolved once at construction; keys are looked up lazily on first use.
pub struct SliceView<V> {
    upstream: V,
    selection: Selection,
    positions: Vec<usize>,
    keys: OnceLock<IndexSet<String>>,
}

impl<V: DatasetView> SliceView<V> {
    /// Resolves `selection` against `upstream`.
    ///
    /// Fails if the upstream has no length, a position is out of range, a key is unknown, a
    /// position/key is selected twice, or a range step is zero.
    pub fn new(upstream: V, selection: Selection) -> IteratorResult<Self> {
        let len = upstream.len()?;
        let positions = match &selection {
            Selection::Range { start, stop, step } => resolve_range(*start, *stop, *step, len)?,
            Selection::Positions(positions) => {
                if let Some(&position) = positions.iter().find(|&&p| p >= len) {
                    return Err(IteratorError::PositionOutOfRange { position, len });
                }
                positions.clone()
            }
            Selection::Keys(keys) => {
                let upstream_keys = upstream.keys()?;
                let index: HashMap<&str, usize> = upstream_keys
                    .iter()
                    .enumerate()
                    .map(|(i, k)| (k.as_str(), i))
                    .collect();
                keys.iter()
                    .map(|k| {
                        index
                            .get(k.as_str())
                            .copied()
                            .ok_or_else(|| IteratorError::key_not_found(k.as_str()))
                    })
                    .collect::<IteratorResult<Vec<_>>>()?
            }
        };

        let mut seen = HashSet::with_capacity(positions.len());
        if let Some(p) = positions.iter().find(|&&p| !seen.insert(p)) {
            return Err(IteratorError::configuration(format!(
                "selection picks upstream position {p} more than once"
            )));
        }

        Ok(Self {
            upstream,
            selection,
            positions,
            keys: OnceLock::new(),
        })
    }

    /// Upstream positions in the order this view yields them.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    fn key_set(&self) -> IteratorResult<&IndexSet<String>> {
        if let Some(keys) = self.keys.get() {
            return Ok(keys);
        }
        let upstream_keys = self.upstream.keys()?;
        let keys = self
            .positions
            .iter()
            .map(|&p| {
                upstream_keys
                    .get(p)
                    .cloned()
                    .ok_or(IteratorError::PositionOutOfRange {
                        position: p,
                        len: upstream_keys.len(),
                    })
            })
            .collect::<IteratorResult<IndexSet<_>>>()?;
        Ok(self.keys.get_or_init(|| keys))
    }
}

/// Python slice semantics over `[0, len)`.
fn resolve_range(
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
    len: usize,
) -> IteratorResult<Vec<usize>> {
    if step == 0 {
        return Err(IteratorError::configuration("slice step cannot be zero"));
    }
    let n = len as isize;
    let bound = |v: Option<isize>, default: isize, lower: isize, upper: isize| match v {
        None => default,
        Some(v) => {
            let v = if v < 0 { v + n } else { v };
            v.clamp(lower, upper)
        }
    };
    let (start, stop) = if step > 0 {
        (bound(start, 0, 0, n), bound(stop, n, 0, n))
    } else {
        (bound(start, n - 1, -1, n - 1), bound(stop, -1, -1, n - 1))
    };

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(i as usize);
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(out)
}

impl<V: fmt::Debug> fmt::Debug for SliceView<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceView")
            .field("upstream", &self.upstream)
            .field("selection", &self.selection)
            .field("len", &self.positions.len())
            .finish()
    }
}

impl<V: DatasetView> DatasetView for SliceView<V> {
    fn iter(&self) -> ExampleIter<'_> {
        Box::new(
            self.positions
                .iter()
                .map(|&p| self.upstream.get_by_position(p)),
        )
    }

    fn len(&self) -> IteratorResult<usize> {
        Ok(self.positions.len())
    }

    fn keys(&self) -> IteratorResult<Vec<String>> {
        Ok(self.key_set()?.iter().cloned().collect())
    }

    fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
        if !self.key_set()?.contains(key) {
            return Err(IteratorError::key_not_found(key));
        }
        self.upstream.get_by_key(key)
    }

    fn get_by_position(&self, position: usize) -> IteratorResult<Example> {
        let p = self
            .positions
            .get(position)
            .ok_or(IteratorError::PositionOutOfRange {
                position,
                len: self.positions.len(),
            })?;
        self.upstream.get_by_position(*p)
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_range;
    use crate::error::IteratorError;
    use crate::keys::EXAMPLE_ID;
    use crate::view::test_support::numbered_source;
    use crate::view::{DatasetView, Selection};

    #[test]
    fn range_matches_python_slicing() {
        assert_eq!(resolve_range(Some(1), Some(3), 1, 5).unwrap(), vec![1, 2]);
        assert_eq!(resolve_range(None, None, 2, 5).unwrap(), vec![0, 2, 4]);
        assert_eq!(resolve_range(Some(-2), None, 1, 5).unwrap(), vec![3, 4]);
        assert_eq!(resolve_range(None, None, -1, 3).unwrap(), vec![2, 1, 0]);
        assert_eq!(resolve_range(Some(10), Some(20), 1, 5).unwrap(), Vec::<usize>::new());
        assert_eq!(resolve_range(Some(-10), Some(2), 1, 5).unwrap(), vec![0, 1]);
        assert!(matches!(
            resolve_range(None, None, 0, 5),
            Err(IteratorError::Configuration { .. })
        ));
    }

    #[test]
    fn slice_positions_delegate_to_upstream() {
        let src = numbered_source(5);
        let slice = src.get_by_selection(1..3).unwrap();
        assert_eq!(slice.len().unwrap(), 2);
        assert_eq!(
            slice.get_by_position(0).unwrap(),
            src.get_by_position(1).unwrap()
        );
        assert_eq!(slice.keys().unwrap(), vec!["ex001", "ex002"]);
    }

    #[test]
    fn key_access_is_restricted_to_the_subset() {
        let src = numbered_source(5);
        let slice = src.get_by_selection(vec![4usize, 0]).unwrap();
        assert_eq!(slice.keys().unwrap(), vec!["ex004", "ex000"]);
        assert!(slice.get_by_key("ex004").is_ok());
        assert!(matches!(
            slice.get_by_key("ex002"),
            Err(IteratorError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn key_selection_resolves_positions() {
        let src = numbered_source(4);
        let slice = src.get_by_selection(vec!["ex003", "ex001"]).unwrap();
        let ids: Vec<_> = slice
            .iter()
            .map(|e| e.unwrap()[EXAMPLE_ID].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["ex003", "ex001"]);
        assert!(matches!(
            src.get_by_selection(vec!["nope"]),
            Err(IteratorError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn invalid_selections_fail_at_construction() {
        let src = numbered_source(3);
        assert!(matches!(
            src.get_by_selection(vec![3usize]),
            Err(IteratorError::PositionOutOfRange { position: 3, len: 3 })
        ));
        assert!(matches!(
            src.get_by_selection(vec![1usize, 1]),
            Err(IteratorError::Configuration { .. })
        ));
        assert!(matches!(
            src.get_by_selection(Selection::range(None, None, 0)),
            Err(IteratorError::Configuration { .. })
        ));
    }

    #[test]
    fn extreme_bounds_and_steps_do_not_overflow() {
        let src = numbered_source(5);
        assert_eq!(src.get_by_selection(0..usize::MAX).unwrap().len().unwrap(), 5);
        assert_eq!(
            src.get_by_selection(usize::MAX..).unwrap().len().unwrap(),
            0
        );
        assert_eq!(src.get_by_selection(..usize::MAX).unwrap().len().unwrap(), 5);

        let one = src
            .get_by_selection(Selection::range(Some(1), None, isize::MAX))
            .unwrap();
        assert_eq!(one.keys().unwrap(), vec!["ex001"]);
        assert_eq!(
            resolve_range(Some(3), None, isize::MIN, 5).unwrap(),
            vec![3]
        );
    }

    #[test]
    fn slices_compose() {
        let src = numbered_source(10);
        let outer = src.get_by_selection(2..).unwrap();
        let inner = outer.get_by_selection(Selection::range(None, None, -3)).unwrap();
        assert_eq!(inner.keys().unwrap(), vec!["ex009", "ex006", "ex003"]);
    }
}
