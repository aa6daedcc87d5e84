//! Lazy, composable dataset views.
//!
//! Every pipeline starts at an [`ExampleSource`] and is extended by wrapping it in further views:
//!
//! - [`MapView`]: applies an [`ExampleTransform`] to each example
//! - [`FilterView`]: keeps examples satisfying an [`ExamplePredicate`]
//! - [`ShuffleView`]: one fixed random permutation, positional access kept
//! - [`ReshuffleView`]: a fresh permutation per pass, positional access disabled
//! - [`SliceView`]: a subset selected by range, positions or keys
//! - [`ConcatenateView`]: several views back to back, ids must be disjoint
//! - [`MixView`]: several views randomly interleaved
//!
//! All views implement [`DatasetView`]: they can be iterated and addressed by key or position.
//! Nothing is read until a view is iterated or indexed, and each view only talks to its immediate
//! upstream.
//!
//! ## Example
//!
//! ```rust
//! use indexmap::IndexMap;
//! use rust_dataset_iterator::IteratorResult;
//! use rust_dataset_iterator::keys::EXAMPLE_ID;
//! use rust_dataset_iterator::types::{Example, Map, Value};
//! use rust_dataset_iterator::view::{DatasetView, ExampleSource};
//!
//! let mut examples: IndexMap<String, Map> = IndexMap::new();
//! for (id, speaker) in [("a", "s1"), ("b", "s2"), ("c", "s1")] {
//!     let mut body = Map::new();
//!     body.insert("speaker".to_string(), Value::from(speaker));
//!     examples.insert(id.to_string(), body);
//! }
//!
//! let pipeline = ExampleSource::new(examples)
//!     .filter(|ex: &Example| ex["speaker"] == Value::from("s1"))
//!     .map(|mut ex: Example| -> IteratorResult<Example> {
//!         ex.insert("checked".to_string(), Value::Bool(true));
//!         Ok(ex)
//!     });
//!
//! let ids: Vec<Value> = pipeline
//!     .iter()
//!     .map(|ex| ex.map(|ex| ex[EXAMPLE_ID].clone()))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(ids, vec![Value::from("a"), Value::from("c")]);
//! assert!(pipeline.len().is_err());
//! ```

mod concatenate;
mod filter;
mod map;
mod mix;
mod shuffle;
mod slice;
mod source;

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};
use std::sync::Arc;

use crate::error::IteratorResult;
use crate::types::Example;

pub use concatenate::ConcatenateView;
pub use filter::FilterView;
pub use map::MapView;
pub use mix::MixView;
pub use shuffle::{ReshuffleView, ShuffleView};
pub use slice::SliceView;
pub use source::ExampleSource;

/// Lazy sequence of examples produced by [`DatasetView::iter`].
pub type ExampleIter<'a> = Box<dyn Iterator<Item = IteratorResult<Example>> + 'a>;

/// Type-erased view.
pub type BoxedView<'a> = Box<dyn DatasetView + 'a>;

/// The contract shared by every view: ordered iteration plus addressing by key and by position.
///
/// Operations a variant cannot support fail with [`crate::IteratorError::Unsupported`].
pub trait DatasetView {
    /// Starts a fresh pass over the view.
    fn iter(&self) -> ExampleIter<'_>;

    /// Number of examples reachable through the view.
    fn len(&self) -> IteratorResult<usize>;

    fn is_empty(&self) -> IteratorResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Ordered ids reachable through the view, consistent with [`Self::len`].
    fn keys(&self) -> IteratorResult<Vec<String>>;

    fn get_by_key(&self, key: &str) -> IteratorResult<Example>;

    fn get_by_position(&self, position: usize) -> IteratorResult<Example>;

    /// Restricts the view to a selection without materializing examples.
    fn get_by_selection(&self, selection: impl Into<Selection>) -> IteratorResult<SliceView<&Self>>
    where
        Self: Sized,
    {
        SliceView::new(self, selection.into())
    }

    /// Applies `transform` to each example on access.
    fn map<F>(self, transform: F) -> MapView<Self, F>
    where
        Self: Sized,
        F: ExampleTransform,
    {
        MapView::new(self, transform)
    }

    /// Keeps only examples for which `predicate` holds.
    fn filter<P>(self, predicate: P) -> FilterView<Self, P>
    where
        Self: Sized,
        P: ExamplePredicate,
    {
        FilterView::new(self, predicate)
    }

    /// Appends `others` after this view. Ids must be unique across all of them.
    fn concatenate<'a>(self, others: Vec<BoxedView<'a>>) -> ConcatenateView<'a>
    where
        Self: Sized + 'a,
    {
        let mut upstreams: Vec<BoxedView<'a>> = Vec::with_capacity(others.len() + 1);
        upstreams.push(Box::new(self));
        upstreams.extend(others);
        ConcatenateView::new(upstreams)
    }

    /// Shuffles the view.
    ///
    /// With `reshuffle = true` every pass uses a new order and positional access is disabled;
    /// otherwise one order is drawn now and positional access keeps working.
    fn shuffle<'a>(self, reshuffle: bool) -> IteratorResult<BoxedView<'a>>
    where
        Self: Sized + 'a,
    {
        if reshuffle {
            Ok(Box::new(ReshuffleView::new(self)?))
        } else {
            Ok(Box::new(ShuffleView::new(self)?))
        }
    }

    fn boxed<'a>(self) -> BoxedView<'a>
    where
        Self: Sized + 'a,
    {
        Box::new(self)
    }
}

macro_rules! forward_dataset_view {
    ($($ty:ty),*) => {$(
        impl<V: DatasetView + ?Sized> DatasetView for $ty {
            fn iter(&self) -> ExampleIter<'_> {
                (**self).iter()
            }

            fn len(&self) -> IteratorResult<usize> {
                (**self).len()
            }

            fn keys(&self) -> IteratorResult<Vec<String>> {
                (**self).keys()
            }

            fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
                (**self).get_by_key(key)
            }

            fn get_by_position(&self, position: usize) -> IteratorResult<Example> {
                (**self).get_by_position(position)
            }
        }
    )*};
}

forward_dataset_view!(&V, Box<V>, Arc<V>);

/// A transformation applied by [`MapView`].
///
/// The transform receives an owned copy and may mutate it in place.
pub trait ExampleTransform {
    fn apply(&self, example: Example) -> IteratorResult<Example>;
}

impl<F> ExampleTransform for F
where
    F: Fn(Example) -> IteratorResult<Example>,
{
    fn apply(&self, example: Example) -> IteratorResult<Example> {
        self(example)
    }
}

/// A predicate applied by [`FilterView`].
pub trait ExamplePredicate {
    fn test(&self, example: &Example) -> IteratorResult<bool>;
}

impl<F> ExamplePredicate for F
where
    F: Fn(&Example) -> bool,
{
    fn test(&self, example: &Example) -> IteratorResult<bool> {
        Ok(self(example))
    }
}

/// Which examples a [`SliceView`] keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Python-style slice: negative bounds count from the end, a negative step walks backwards.
    Range {
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    },
    /// Explicit upstream positions, in the order given.
    Positions(Vec<usize>),
    /// Explicit upstream keys, in the order given.
    Keys(Vec<String>),
}

impl Selection {
    pub fn range(start: Option<isize>, stop: Option<isize>, step: isize) -> Self {
        Self::Range { start, stop, step }
    }
}

/// Bounds past `isize::MAX` saturate; they are clamped to the view length on resolution anyway.
fn saturating_bound(bound: usize) -> isize {
    isize::try_from(bound).unwrap_or(isize::MAX)
}

impl From<Range<usize>> for Selection {
    fn from(r: Range<usize>) -> Self {
        Self::range(
            Some(saturating_bound(r.start)),
            Some(saturating_bound(r.end)),
            1,
        )
    }
}

impl From<RangeFrom<usize>> for Selection {
    fn from(r: RangeFrom<usize>) -> Self {
        Self::range(Some(saturating_bound(r.start)), None, 1)
    }
}

impl From<RangeTo<usize>> for Selection {
    fn from(r: RangeTo<usize>) -> Self {
        Self::range(None, Some(saturating_bound(r.end)), 1)
    }
}

impl From<RangeFull> for Selection {
    fn from(_: RangeFull) -> Self {
        Self::range(None, None, 1)
    }
}

impl From<Vec<usize>> for Selection {
    fn from(positions: Vec<usize>) -> Self {
        Self::Positions(positions)
    }
}

impl From<Vec<String>> for Selection {
    fn from(keys: Vec<String>) -> Self {
        Self::Keys(keys)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(keys: Vec<&str>) -> Self {
        Self::Keys(keys.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use indexmap::IndexMap;

    use super::ExampleSource;
    use crate::types::{Map, Value};

    /// A source whose examples carry a single integer field `value`.
    pub(crate) fn source_of(entries: &[(&str, i64)]) -> ExampleSource {
        let examples: IndexMap<String, Map> = entries
            .iter()
            .map(|(id, v)| {
                let mut body = Map::new();
                body.insert("value".to_string(), Value::Int64(*v));
                (id.to_string(), body)
            })
            .collect();
        ExampleSource::new(examples)
    }

    pub(crate) fn numbered_source(n: usize) -> ExampleSource {
        let ids: Vec<String> = (0..n).map(|i| format!("ex{i:03}")).collect();
        let entries: Vec<(&str, i64)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i as i64))
            .collect();
        source_of(&entries)
    }
}
