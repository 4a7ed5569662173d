//! Survey dataset loading.
//!
//! This crate reads uploaded survey files into [`xtab_model::Dataset`]s with
//! column kinds and labels resolved once, at load time.
//!
//! # Features
//!
//! - **CSV Loading**: single header, or a question-label row above the
//!   variable-name row
//! - **Pluggable Formats**: [`DatasetLoader`] implementations registered on a
//!   [`LoaderRegistry`] and chosen by file extension
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use xtab_ingest::LoaderRegistry;
//!
//! let dataset = LoaderRegistry::with_defaults().load(Path::new("survey.csv"))?;
//! ```

mod csv;
mod error;
mod loader;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{CsvHeaders, MAX_CSV_FILE_SIZE, read_csv_schema, read_csv_table};

// === Loaders ===
pub use loader::{CsvLoader, DatasetLoader, LoaderRegistry};
