//! Example enrichers.
//!
//! Enrichers are function objects plugged into [`crate::view::DatasetView::map`] (transforms) or
//! [`crate::view::DatasetView::filter`] (predicates):
//!
//! - [`AudioReader`]: replaces nested audio paths by decoded signals
//! - [`AlignmentReader`]: attaches frame-level alignments looked up by example id
//! - [`AlignmentValidity`]: drops examples whose alignment does not fit the signal length
//! - [`Word2Id`]: turns transcriptions into word-id arrays
//! - [`IdFilter`]: keeps an allow-list of example ids
//!
//! [`recursive_transform`] is the shared tree walk behind the readers.
//!
//! ## Example: alignments on a filtered pipeline
//!
//! ```rust
//! use indexmap::IndexMap;
//! use rust_dataset_iterator::processing::{AlignmentReader, AlignmentValidity, Alignments, IdFilter};
//! use rust_dataset_iterator::types::{Map, Value};
//! use rust_dataset_iterator::view::{DatasetView, ExampleSource};
//!
//! let mut examples: IndexMap<String, Map> = IndexMap::new();
//! for id in ["001", "002", "003"] {
//!     let mut body = Map::new();
//!     body.insert("num_samples".to_string(), Value::Int64(1840));
//!     examples.insert(id.to_string(), body);
//! }
//! let alignments = Alignments::from([
//!     ("001".to_string(), vec![1; 10]),
//!     ("002".to_string(), vec![1; 7]),
//! ]);
//!
//! let pipeline = ExampleSource::new(examples)
//!     .filter(IdFilter::new(["001", "002"]))
//!     .map(AlignmentReader::from_alignments(alignments))
//!     .filter(AlignmentValidity::new());
//!
//! let kept: Vec<_> = pipeline.iter().collect::<Result<_, _>>().unwrap();
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept[0]["num_alignment_frames"], Value::Int64(10));
//! ```

pub mod alignment;
pub mod audio;
pub mod id_filter;
pub mod recursive;
pub mod word2id;

pub use alignment::{
    AlignmentReader, AlignmentReaderOptions, AlignmentValidity, Alignments, read_text_alignments,
};
#[cfg(feature = "wav")]
pub use audio::read_wav;
pub use audio::{AudioReader, AudioReaderOptions, LeafReader};
pub use id_filter::IdFilter;
pub use recursive::{TransformOptions, recursive_transform, recursive_transform_with, stack_values};
pub use word2id::Word2Id;

use crate::keys::EXAMPLE_ID;
use crate::types::{Example, Value};

/// The example's id for error messages.
pub(crate) fn example_id(example: &Example) -> String {
    example
        .get(EXAMPLE_ID)
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string()
}
