//! Dataset loaders and extension-based dispatch.
//!
//! The CSV loader ships with the crate. Other formats (SPSS `.sav`, for
//! instance) are provided by the caller as [`DatasetLoader`] implementations
//! and registered on a [`LoaderRegistry`].

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};
use xtab_model::{ColumnKind, ColumnMeta, Dataset};

use crate::csv::{MAX_CSV_FILE_SIZE, check_file_size_with_limit, read_csv_table, validate_encoding};
use crate::error::{IngestError, Result};

/// Reads one file format into a [`Dataset`].
///
/// Implementations resolve column kinds, labels, value labels, and missing
/// codes at load time; the engine never re-infers them.
pub trait DatasetLoader: Send + Sync {
    /// Short name used in logs (e.g. "csv").
    fn name(&self) -> &'static str;

    /// Lowercase file extensions this loader handles, without the dot.
    fn extensions(&self) -> &[&'static str];

    /// Loads the file at `path`.
    fn load(&self, path: &Path) -> Result<Dataset>;
}

/// Loads comma-separated files with one or two header rows.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    header_rows: usize,
    max_file_size: u64,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            header_rows: 1,
            max_file_size: MAX_CSV_FILE_SIZE,
        }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect a question-label row above the variable-name row.
    #[must_use]
    pub fn with_label_row(mut self) -> Self {
        self.header_rows = 2;
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}

impl DatasetLoader for CsvLoader {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extensions(&self) -> &[&'static str] {
        &["csv"]
    }

    fn load(&self, path: &Path) -> Result<Dataset> {
        check_file_size_with_limit(path, self.max_file_size)?;
        validate_encoding(path)?;
        let (frame, headers) = read_csv_table(path, self.header_rows)?;

        let labels = headers.labels_by_column();
        let metadata: BTreeMap<String, ColumnMeta> = frame
            .get_columns()
            .iter()
            .map(|column| {
                let name = column.name().to_string();
                let mut meta = ColumnMeta::new(ColumnKind::from_dtype(column.dtype()));
                if let Some(label) = labels.get(&name) {
                    meta = meta.with_label(label.clone());
                }
                (name, meta)
            })
            .collect();

        Ok(Dataset::with_metadata(frame, metadata))
    }
}

/// Loaders indexed by file extension.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn DatasetLoader>>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LoaderRegistry {
    /// Creates a registry with no loaders.
    pub fn empty() -> Self {
        Self {
            loaders: Vec::new(),
        }
    }

    /// Creates a registry with the built-in CSV loader.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(CsvLoader::default()));
        registry
    }

    /// Registers a loader. A later loader wins for a shared extension.
    pub fn register(&mut self, loader: Box<dyn DatasetLoader>) {
        self.loaders.insert(0, loader);
    }

    /// Finds the loader for a path's extension.
    pub fn loader_for(&self, path: &Path) -> Option<&dyn DatasetLoader> {
        let extension = extension_of(path);
        self.loaders
            .iter()
            .find(|loader| loader.extensions().contains(&extension.as_str()))
            .map(Box::as_ref)
    }

    /// Every extension some loader handles, sorted.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut all: Vec<&'static str> = self
            .loaders
            .iter()
            .flat_map(|loader| loader.extensions().iter().copied())
            .collect();
        all.sort_unstable();
        all.dedup();
        all
    }

    /// Loads `path` with the loader registered for its extension.
    pub fn load(&self, path: &Path) -> Result<Dataset> {
        let loader = self
            .loader_for(path)
            .ok_or_else(|| IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension_of(path),
            })?;
        debug!(loader = loader.name(), path = %path.display(), "dispatching load");
        let dataset = loader.load(path)?;
        info!(
            path = %path.display(),
            rows = dataset.height(),
            columns = dataset.column_names().len(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_defaults_to_csv() {
        let registry = LoaderRegistry::with_defaults();
        assert_eq!(registry.extensions(), vec!["csv"]);
        assert!(registry.loader_for(Path::new("survey.CSV")).is_some());
        assert!(registry.loader_for(Path::new("survey.sav")).is_none());
    }

    #[test]
    fn test_unregistered_extension_rejected() {
        let registry = LoaderRegistry::with_defaults();
        let err = registry.load(Path::new("survey.sav")).unwrap_err();
        assert!(matches!(
            err,
            IngestError::UnsupportedFormat { ref extension, .. } if extension == "sav"
        ));
    }
}
