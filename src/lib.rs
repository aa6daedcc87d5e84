//! `rust-dataset-iterator` builds lazy, composable pipelines over speech corpora described by a
//! JSON database.
//!
//! A pipeline starts at an [`view::ExampleSource`] (usually obtained from a
//! [`database::DatabaseDescription`]) and is extended with views: map, filter, shuffle, slice,
//! concatenate and mix. Nothing is read until the pipeline is iterated or indexed.
//!
//! ## Examples and values
//!
//! An example is an ordered mapping of field name to [`types::Value`], a tagged tree of scalars,
//! strings, lists, maps and n-dimensional array leaves ([`types::ArrayValue`]). Every example
//! produced by a pipeline carries its id under [`keys::EXAMPLE_ID`]. Reads return owned copies, so
//! transforms may mutate what they receive.
//!
//! ## Addressing
//!
//! Every view implements [`view::DatasetView`]:
//!
//! - `iter()`: a fresh lazy pass
//! - `len()` / `keys()`: cardinality and ordered ids, where the view knows them
//! - `get_by_key(id)`, `get_by_position(i)`, `get_by_selection(..)`
//!
//! Operations a view cannot honor (e.g. `len()` after a filter) fail with
//! [`IteratorError::Unsupported`] instead of guessing.
//!
//! ## Quick example: load, enrich, shuffle
//!
//! ```rust
//! use rust_dataset_iterator::database::DatabaseDescription;
//! use rust_dataset_iterator::processing::{AlignmentReader, Alignments};
//! use rust_dataset_iterator::types::Value;
//! use rust_dataset_iterator::view::{DatasetView, ShuffleView};
//!
//! # fn main() -> Result<(), rust_dataset_iterator::IteratorError> {
//! let db = DatabaseDescription::from_json_str(
//!     r#"{"datasets": {"train": {
//!         "u1": {"transcription": "hello world"},
//!         "u2": {"transcription": "good bye"},
//!         "u3": {"transcription": "hello again"}
//!     }}}"#,
//! )?;
//! let alignments = Alignments::from([("u2".to_string(), vec![4, 4, 5])]);
//!
//! let train = db.example_source("train")?;
//! let pipeline = ShuffleView::with_seed(&train, 7)?.map(AlignmentReader::from_alignments(alignments));
//!
//! assert_eq!(pipeline.len()?, 3);
//! assert_eq!(pipeline.get_by_key("u2")?["num_alignment_frames"], Value::Int64(3));
//!
//! // The order is fixed per shuffle, so positions are stable across passes.
//! let first = pipeline.get_by_position(0)?;
//! assert_eq!(pipeline.iter().next().transpose()?, Some(first));
//! # Ok(())
//! # }
//! ```
//!
//! ## Enrichers
//!
//! [`processing`] provides transforms and predicates for speech data: reading audio, attaching
//! alignments, checking alignment lengths, mapping words to ids and filtering by id. Components
//! reporting per-example anomalies take a [`observability::PipelineObserver`].
//!
//! ## Modules
//!
//! - [`view`]: the view family and the [`view::DatasetView`] contract
//! - [`processing`]: example enrichers and the recursive leaf transform
//! - [`database`]: JSON database descriptions
//! - [`types`]: example values
//! - [`keys`]: reserved field names
//! - [`observability`]: observer hooks
//! - [`error`]: the crate error type
//!
//! ## Cargo features
//!
//! - `wav` (default): [`processing::read_wav`] and `AudioReader::new`, backed by `hound`

pub mod database;
pub mod error;
pub mod keys;
pub mod observability;
pub mod processing;
pub mod types;
pub mod view;

pub use error::{IteratorError, IteratorResult};
