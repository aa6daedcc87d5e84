//! Random permutation views.
//!
//! [`ShuffleView`] draws one permutation at construction and keeps positional access.
//! [`ReshuffleView`] draws a new permutation on every pass and therefore disables it.

use std::cell::RefCell;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{IteratorError, IteratorResult};
use crate::types::Example;

use super::{DatasetView, ExampleIter};

fn identity(len: usize) -> Vec<usize> {
    (0..len).collect()
}

/// Yields the upstream examples in one fixed random order.
///
/// Repeated passes use the same order. `get_by_key` is unaffected by the permutation and `keys`
/// lists the upstream keys in permuted order, so key and position stay aligned.
pub struct ShuffleView<V> {
    upstream: V,
    permutation: Vec<usize>,
}

impl<V: DatasetView> ShuffleView<V> {
    /// Shuffles with the thread-local RNG.
    pub fn new(upstream: V) -> IteratorResult<Self> {
        Self::with_rng(upstream, &mut rand::rng())
    }

    /// Shuffles reproducibly.
    pub fn with_seed(upstream: V, seed: u64) -> IteratorResult<Self> {
        Self::with_rng(upstream, &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(upstream: V, rng: &mut R) -> IteratorResult<Self> {
        let mut permutation = identity(upstream.len()?);
        permutation.shuffle(rng);
        Ok(Self {
            upstream,
            permutation,
        })
    }

    /// Upstream position for each position of this view.
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }
}

impl<V: fmt::Debug> fmt::Debug for ShuffleView<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShuffleView")
            .field("upstream", &self.upstream)
            .field("len", &self.permutation.len())
            .finish()
    }
}

impl<V: DatasetView> DatasetView for ShuffleView<V> {
    fn iter(&self) -> ExampleIter<'_> {
        Box::new(
            self.permutation
                .iter()
                .map(|&idx| self.upstream.get_by_position(idx)),
        )
    }

    fn len(&self) -> IteratorResult<usize> {
        Ok(self.permutation.len())
    }

    fn keys(&self) -> IteratorResult<Vec<String>> {
        let keys = self.upstream.keys()?;
        self.permutation
            .iter()
            .map(|&idx| {
                keys.get(idx).cloned().ok_or(IteratorError::PositionOutOfRange {
                    position: idx,
                    len: keys.len(),
                })
            })
            .collect()
    }

    fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
        self.upstream.get_by_key(key)
    }

    fn get_by_position(&self, position: usize) -> IteratorResult<Example> {
        let idx = self
            .permutation
            .get(position)
            .ok_or(IteratorError::PositionOutOfRange {
                position,
                len: self.permutation.len(),
            })?;
        self.upstream.get_by_position(*idx)
    }
}

struct ReshuffleState {
    rng: StdRng,
    permutation: Vec<usize>,
}

/// Yields the upstream examples in a new random order on every pass.
///
/// Positions have no stable meaning, so `get_by_position` is unsupported; `get_by_key` and
/// `keys` delegate to the upstream. The permutation lives in a `RefCell`, so the view is not
/// `Sync`: sharing one instance across threads requires the caller to serialize iteration.
pub struct ReshuffleView<V> {
    upstream: V,
    state: RefCell<ReshuffleState>,
}

impl<V: DatasetView> ReshuffleView<V> {
    pub fn new(upstream: V) -> IteratorResult<Self> {
        Self::with_rng(upstream, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(upstream: V, seed: u64) -> IteratorResult<Self> {
        Self::with_rng(upstream, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(upstream: V, rng: StdRng) -> IteratorResult<Self> {
        let permutation = identity(upstream.len()?);
        Ok(Self {
            upstream,
            state: RefCell::new(ReshuffleState { rng, permutation }),
        })
    }
}

impl<V: fmt::Debug> fmt::Debug for ReshuffleView<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReshuffleView")
            .field("upstream", &self.upstream)
            .finish_non_exhaustive()
    }
}

impl<V: DatasetView> DatasetView for ReshuffleView<V> {
    fn iter(&self) -> ExampleIter<'_> {
        let order = {
            let mut state = self.state.borrow_mut();
            let ReshuffleState { rng, permutation } = &mut *state;
            permutation.shuffle(rng);
            permutation.clone()
        };
        Box::new(
            order
                .into_iter()
                .map(|idx| self.upstream.get_by_position(idx)),
        )
    }

    fn len(&self) -> IteratorResult<usize> {
        Ok(self.state.borrow().permutation.len())
    }

    fn keys(&self) -> IteratorResult<Vec<String>> {
        self.upstream.keys()
    }

    fn get_by_key(&self, key: &str) -> IteratorResult<Example> {
        self.upstream.get_by_key(key)
    }

    fn get_by_position(&self, _position: usize) -> IteratorResult<Example> {
        Err(IteratorError::unsupported("ReshuffleView", "get_by_position"))
    }
}
