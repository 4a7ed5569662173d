//! CSV reading.

mod header;
mod reader;

pub use header::CsvHeaders;
pub use reader::{MAX_CSV_FILE_SIZE, read_csv_schema, read_csv_table};
pub(crate) use reader::{check_file_size_with_limit, validate_encoding};
