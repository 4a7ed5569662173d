//! Cell-level helpers shared by the survey cross-tabulation crates.

pub mod polars;

pub use polars::{any_to_f64, any_to_string, format_numeric, is_missing, is_numeric_dtype, parse_f64};
