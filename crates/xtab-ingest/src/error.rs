//! Error types for dataset loading.

use std::io;
use std::path::{Path, PathBuf};

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while turning a file into a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("data file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file {path} is {size} bytes, limit is {max_size}")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// The file starts with a byte-order mark for an encoding other than UTF-8.
    #[error("unsupported encoding {encoding} in {path}")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// No header, or a header without respondent rows.
    #[error("dataset is empty: {path}")]
    EmptyDataset { path: PathBuf },

    #[error("empty column name in {path}")]
    EmptyColumnName { path: PathBuf },

    /// No loader claims the file's extension.
    #[error("no loader registered for '{extension}' files ({path})")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A loader's own frame construction failed.
    #[error("dataframe operation failed: {0}")]
    Polars(#[from] PolarsError),
}

impl IngestError {
    /// Classifies an I/O failure on `path`; a missing file gets its own variant.
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        match source.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound { path },
            _ => Self::FileRead { path, source },
        }
    }

    pub(crate) fn empty(path: &Path) -> Self {
        Self::EmptyDataset {
            path: path.to_path_buf(),
        }
    }

    pub(crate) fn csv(path: &Path, error: &PolarsError) -> Self {
        Self::CsvParse {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, IngestError>;
