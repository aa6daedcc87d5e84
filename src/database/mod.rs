//! Database descriptions: named datasets of examples, loaded from JSON.
//!
//! A description maps dataset names to ordered `id -> body` mappings. [`DatabaseDescription`]
//! turns those into [`ExampleSource`]s, the roots of every pipeline.
//!
//! ## Example
//!
//! ```rust
//! use rust_dataset_iterator::database::DatabaseDescription;
//! use rust_dataset_iterator::view::DatasetView;
//!
//! # fn main() -> Result<(), rust_dataset_iterator::IteratorError> {
//! let db = DatabaseDescription::from_json_str(
//!     r#"{"datasets": {
//!         "train": {"u1": {"num_samples": 16000}, "u2": {"num_samples": 8000}},
//!         "dev": {"u3": {"num_samples": 4000}}
//!     }}"#,
//! )?;
//! let examples = db.get_examples(&["train", "dev"])?;
//! assert_eq!(examples.len()?, 3);
//! assert_eq!(examples.keys()?, vec!["u1", "u2", "u3"]);
//! # Ok(())
//! # }
//! ```

pub mod json;

use std::path::Path;

use crate::error::{IteratorError, IteratorResult};
use crate::view::{BoxedView, ConcatenateView, DatasetView, ExampleSource};

pub use json::{Datasets, Examples, parse_description_path, parse_description_str};

/// In-memory database description.
#[derive(Debug, Clone, Default)]
pub struct DatabaseDescription {
    datasets: Datasets,
}

impl DatabaseDescription {
    pub fn new(datasets: Datasets) -> Self {
        Self { datasets }
    }

    pub fn from_json_str(input: &str) -> IteratorResult<Self> {
        Ok(Self::new(parse_description_str(input)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> IteratorResult<Self> {
        Ok(Self::new(parse_description_path(path)?))
    }

    /// Loads and merges every file matching `pattern`, in sorted path order.
    ///
    /// Fails if nothing matches or two files define the same dataset.
    pub fn from_glob(pattern: &str) -> IteratorResult<Self> {
        let mut paths = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
        if paths.is_empty() {
            return Err(IteratorError::configuration(format!(
                "no database description matches '{pattern}'"
            )));
        }
        paths.sort();

        let mut db = Self::default();
        for path in paths {
            db.merge(Self::from_path(&path)?)?;
        }
        Ok(db)
    }

    /// Adds the datasets of `other`. Dataset names must not overlap.
    pub fn merge(&mut self, other: Self) -> IteratorResult<()> {
        let mut duplicates: Vec<String> = other
            .datasets
            .keys()
            .filter(|name| self.datasets.contains_key(*name))
            .cloned()
            .collect();
        if !duplicates.is_empty() {
            duplicates.sort();
            return Err(IteratorError::DuplicateKey { keys: duplicates });
        }
        self.datasets.extend(other.datasets);
        Ok(())
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    fn dataset(&self, name: &str) -> IteratorResult<&Examples> {
        self.datasets
            .get(name)
            .ok_or_else(|| IteratorError::DatasetNotFound {
                name: name.to_string(),
                available: self.datasets.keys().cloned().collect(),
            })
    }

    /// A source over one dataset, named after it.
    pub fn example_source(&self, name: &str) -> IteratorResult<ExampleSource> {
        Ok(ExampleSource::new(self.dataset(name)?.clone()).with_name(name))
    }

    /// Sources for `names`, concatenated in the given order.
    ///
    /// A single name yields its source directly. Example ids must be unique across the datasets;
    /// this is checked on first key access of the returned view.
    pub fn get_examples(&self, names: &[&str]) -> IteratorResult<BoxedView<'static>> {
        match names {
            [] => Err(IteratorError::configuration(
                "get_examples needs at least one dataset name",
            )),
            [name] => Ok(self.example_source(name)?.boxed()),
            names => {
                let sources = names
                    .iter()
                    .map(|name| -> IteratorResult<BoxedView<'static>> {
                        Ok(self.example_source(name)?.boxed())
                    })
                    .collect::<IteratorResult<Vec<_>>>()?;
                Ok(ConcatenateView::new(sources).boxed())
            }
        }
    }
}
