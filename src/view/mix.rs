//! Random interleaving of several views.

use std::cell::RefCell;
use std::fmt;
use std::sync::OnceLock;

use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{IteratorError, IteratorResult};
use crate::types::Example;

use super::concatenate::{KeyIndex, cached_key_index};
use super::{BoxedView, DatasetView, ExampleIter};

/// Interleaves several upstream views at random.
///
/// One pass is finite and yields every upstream example exactly once. Before each example a
/// stream is drawn with probability proportional to its weight among the streams that still have
/// examples; an exhausted stream drops out and the remaining weights are renormalized. If only
/// zero-weight streams remain they are drawn uniformly. Each call to `iter` starts a new pass
/// with a new interleaving; within a stream the upstream order is kept.
///
/// `keys` and `get_by_key` behave like [`super::ConcatenateView`], ids must be unique across
/// streams. Positional access is unsupported because the interleaving differs between passes.
/// The RNG lives in a `RefCell`, so the view is not `Sync`.
pub struct MixView<'a> {
    upstreams: Vec<BoxedView<'a>>,
    probabilities: Vec<f64>,
    key_index: OnceLock<KeyIndex>,
    rng: RefCell<StdRng>,
}

impl<'a> MixView<'a> {
    /// Mixes `upstreams` with probabilities `p` (uniform if `None`).
    ///
    /// `p` needs one non-negative finite entry per upstream and a positive sum; it is normalized.
    pub fn new(upstreams: Vec<BoxedView<'a>>, p: Option<Vec<f64>>) -> IteratorResult<Self> {
        Self::with_rng(upstreams, p, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(
        upstreams: Vec<BoxedView<'a>>,
        p: Option<Vec<f64>>,
        seed: u64,
    ) -> IteratorResult<Self> {
        Self::with_rng(upstreams, p, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(
        upstreams: Vec<BoxedView<'a>>,
        p: Option<Vec<f64>>,
        rng: StdRng,
    ) -> IteratorResult<Self> {
        let count = upstreams.len();
        if count == 0 {
            return Err(IteratorError::configuration("mix needs at least one upstream view"));
        }
        let probabilities = match p {
            None => vec![1.0 / count as f64; count],
            Some(p) => normalize(p, count)?,
        };
        Ok(Self {
            upstreams,
            probabilities,
            key_index: OnceLock::new(),
            rng: RefCell::new(rng),
        })
    }

    /// Normalized stream probabilities.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

fn normalize(p: Vec<f64>, count: usize) -> IteratorResult<Vec<f64>> {
    if p.len() != count {
        return Err(IteratorError::configuration(format!(
            "mix got {} probabilities for {count} upstream views",
            p.len()
        )));
    }
    if let Some(bad) = p.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(IteratorError::configuration(format!(
            "mix probability {bad} is not a finite non-negative number"
        )));
    }
    let sum: f64 = p.iter().sum();
    if sum <= 0.0 {
        return Err(IteratorError::configuration("mix probabilities sum to zero"));
    }
    Ok(p.into_iter().map(|w| w / sum).collect())
}

impl fmt::Debug for MixView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixView")
            .field("upstreams", &self.upstreams.len())
            .field("probabilities", &self.probabilities)
            .finish_non_exhaustive()
    }
}

struct MixIter<'a> {
    streams: Vec<ExampleIter<'a>>,
    probabilities: Vec<f64>,
    active: Vec<usize>,
    distribution: Option<WeightedIndex<f64>>,
    rng: StdRng,
}

impl MixIter<'_> {
    fn rebuild_distribution(&mut self) {
        let weights: Vec<f64> = self.active.iter().map(|&i| self.probabilities[i]).collect();
        // All-zero (or empty) weights fall back to uniform draws.
        self.distribution = WeightedIndex::new(&weights).ok();
    }
}

impl Iterator for MixIter<'_> {
    type Item = IteratorResult<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.active.is_empty() {
            let slot = match &self.distribution {
                Some(d) => d.sample(&mut self.rng),
                None => self.rng.random_range(0..self.active.len()),
            };
            match self.streams[self.active[slot]].next() {
                Some(item) => return Some(item),
                None => {
                    self.active.remove(slot);
                    self.rebuild_distribution();
                }
            }
        }
        None
    }
}

impl DatasetView for MixView<'_> {
    fn iter(&self) -> ExampleIter<'_> {
        let rng = StdRng::from_rng(&mut *self.rng.borrow_mut());
        let mut iter = MixIter {
            streams: self.upstreams.iter().map(|u| u.iter()).collect(),
            probabilities: self.probabilities.clone(),
            active: (0..self.upstreams.len()).collect(),
            distribution: None,
            rng,
        };
        iter.rebuild_distribution();
        Box::new(iter)
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

    fn get_by_position(&self, _position: usize) -> IteratorResult<Example> {
        Err(IteratorError::unsupported("MixView", "get_by_position"))
    }
}

#[cfg(test)]
mod tests {
    use super::MixView;
    use crate::error::IteratorError;
    use crate::keys::EXAMPLE_ID;
    use crate::view::DatasetView;
    use crate::view::test_support::source_of;

    fn ids(view: &MixView<'_>) -> Vec<String> {
        view.iter()
            .map(|e| e.unwrap()[EXAMPLE_ID].as_str().unwrap().to_string())
            .collect()
    }

    fn two_streams<'a>() -> Vec<crate::view::BoxedView<'a>> {
        vec![
            source_of(&[("a1", 1), ("a2", 2), ("a3", 3), ("a4", 4)]).boxed(),
            source_of(&[("b1", 5), ("b2", 6)]).boxed(),
        ]
    }

    #[test]
    fn one_pass_yields_every_example_once_keeping_stream_order() {
        let mix = MixView::with_seed(two_streams(), None, 42).unwrap();
        let seen = ids(&mix);
        assert_eq!(seen.len(), 6);

        let a: Vec<_> = seen.iter().filter(|k| k.starts_with('a')).cloned().collect();
        let b: Vec<_> = seen.iter().filter(|k| k.starts_with('b')).cloned().collect();
        assert_eq!(a, vec!["a1", "a2", "a3", "a4"]);
        assert_eq!(b, vec!["b1", "b2"]);
        assert_eq!(mix.len().unwrap(), 6);
    }

    #[test]
    fn zero_weight_stream_is_drained_last() {
        let mix = MixView::with_seed(two_streams(), Some(vec![1.0, 0.0]), 1).unwrap();
        assert_eq!(ids(&mix), vec!["a1", "a2", "a3", "a4", "b1", "b2"]);
    }

    #[test]
    fn probabilities_are_normalized() {
        let mix = MixView::with_seed(two_streams(), Some(vec![3.0, 1.0]), 0).unwrap();
        assert_eq!(mix.probabilities(), &[0.75, 0.25]);
        let uniform = MixView::with_seed(two_streams(), None, 0).unwrap();
        assert_eq!(uniform.probabilities(), &[0.5, 0.5]);
    }

    #[test]
    fn invalid_probabilities_are_configuration_errors() {
        for p in [vec![1.0], vec![-1.0, 2.0], vec![0.0, 0.0], vec![f64::NAN, 1.0]] {
            assert!(matches!(
                MixView::with_seed(two_streams(), Some(p), 0),
                Err(IteratorError::Configuration { .. })
            ));
        }
        assert!(matches!(
            MixView::new(Vec::new(), None),
            Err(IteratorError::Configuration { .. })
        ));
    }

    #[test]
    fn keys_and_key_access_span_all_streams() {
        let mix = MixView::with_seed(two_streams(), None, 3).unwrap();
        assert_eq!(mix.keys().unwrap().len(), 6);
        assert!(mix.get_by_key("b2").is_ok());
        assert!(matches!(
            mix.get_by_position(0),
            Err(IteratorError::Unsupported { .. })
        ));
    }
}
