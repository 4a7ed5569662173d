//! CSV file reading with an explicit header row count.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

use super::header::{CsvHeaders, parse_csv_line};

/// Maximum file size accepted by the default CSV loader (500 MB).
pub const MAX_CSV_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Rows sampled by Polars when inferring column dtypes.
const INFER_SCHEMA_ROWS: usize = 1000;

/// Column count above which a load is logged as unusually wide.
const WIDE_DATASET_COLUMNS: usize = 500;

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| IngestError::io(path, e))
}

/// Rejects files larger than `max_size` bytes.
pub(crate) fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<()> {
    let size = open(path)?
        .metadata()
        .map_err(|e| IngestError::io(path, e))?
        .len();
    if size > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_size,
        });
    }
    Ok(())
}

/// Rejects UTF-16 files; a UTF-8 BOM is accepted and stripped later.
pub(crate) fn validate_encoding(path: &Path) -> Result<()> {
    let mut buffer = [0u8; 2];
    let read = open(path)?
        .read(&mut buffer)
        .map_err(|e| IngestError::io(path, e))?;
    if read < 2 {
        return Ok(());
    }
    let encoding = match buffer {
        [0xFF, 0xFE] => "UTF-16 LE",
        [0xFE, 0xFF] => "UTF-16 BE",
        _ => return Ok(()),
    };
    Err(IngestError::UnsupportedEncoding {
        path: path.to_path_buf(),
        encoding,
    })
}

fn read_first_lines(path: &Path, n: usize) -> Result<Vec<String>> {
    let reader = BufReader::new(open(path)?);
    let mut lines = Vec::with_capacity(n);
    for line in reader.lines().take(n) {
        let line = line.map_err(|e| IngestError::io(path, e))?;
        let line = line.strip_prefix('\u{feff}').unwrap_or(&line).to_string();
        lines.push(line);
    }
    Ok(lines)
}

/// Reads the header rows of a CSV file.
///
/// - `header_rows = 1`: a single row of variable names
/// - `header_rows = 2`: question labels, then variable names
pub fn read_csv_schema(path: &Path, header_rows: usize) -> Result<CsvHeaders> {
    let lines = read_first_lines(path, header_rows.clamp(1, 2))?;
    let headers = match lines.as_slice() {
        [] => None,
        [labels, names] if header_rows >= 2 => {
            Some(CsvHeaders::double(parse_csv_line(labels), parse_csv_line(names)))
        }
        [names, ..] => Some(CsvHeaders::single(parse_csv_line(names))),
    };
    let headers = headers.ok_or_else(|| IngestError::empty(path))?;
    if headers.columns.iter().any(String::is_empty) {
        return Err(IngestError::EmptyColumnName {
            path: path.to_path_buf(),
        });
    }
    Ok(headers)
}

/// Reads a CSV file into a DataFrame, returning the header layout with it.
pub fn read_csv_table(path: &Path, header_rows: usize) -> Result<(DataFrame, CsvHeaders)> {
    let headers = read_csv_schema(path, header_rows)?;
    let parse_error = |e: PolarsError| IngestError::csv(path, &e);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(headers.skip_rows - 1)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(parse_error)?
        .finish()
        .map_err(parse_error)?;

    if df.height() == 0 {
        return Err(IngestError::empty(path));
    }
    if df.width() > WIDE_DATASET_COLUMNS {
        warn!(
            path = %path.display(),
            columns = df.width(),
            "unusually wide dataset"
        );
    }
    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        header_rows = headers.skip_rows,
        "csv read"
    );
    Ok((df, headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_read_csv_schema_with_bom() {
        let file = create_temp_csv("\u{feff}gender,vote\nM,Y\n".as_bytes());
        let headers = read_csv_schema(file.path(), 1).unwrap();
        assert_eq!(headers.columns, vec!["gender", "vote"]);
    }

    #[test]
    fn test_read_csv_schema_empty_file() {
        let file = create_temp_csv(b"");
        let result = read_csv_schema(file.path(), 1);
        assert!(matches!(result, Err(IngestError::EmptyDataset { .. })));
    }

    #[test]
    fn test_blank_header_rejected() {
        let file = create_temp_csv(b"gender,,vote\nM,1,Y\n");
        let result = read_csv_schema(file.path(), 1);
        assert!(matches!(result, Err(IngestError::EmptyColumnName { .. })));
    }

    #[test]
    fn test_utf16_rejected() {
        let file = create_temp_csv(&[0xFF, 0xFE, b'a', 0]);
        assert!(matches!(
            validate_encoding(file.path()),
            Err(IngestError::UnsupportedEncoding { encoding: "UTF-16 LE", .. })
        ));
    }

    #[test]
    fn test_size_limit() {
        let file = create_temp_csv(b"a,b\n1,2\n");
        assert!(check_file_size_with_limit(file.path(), 1024).is_ok());
        assert!(matches!(
            check_file_size_with_limit(file.path(), 4),
            Err(IngestError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_read_csv_table_double_header() {
        let file = create_temp_csv(b"Gender,Vote intention\ngender,vote\nM,Y\nF,N\n");
        let (df, headers) = read_csv_table(file.path(), 2).unwrap();
        assert_eq!(headers.label_for("vote"), Some("Vote intention"));
        assert_eq!(df.height(), 2);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["gender", "vote"]);
    }

    #[test]
    fn test_header_only_is_empty() {
        let file = create_temp_csv(b"gender,vote\n");
        assert!(matches!(
            read_csv_table(file.path(), 1),
            Err(IngestError::EmptyDataset { .. })
        ));
    }
}
