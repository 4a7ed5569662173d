//! Library side of the `xtab` command-line tool.

pub mod logging;
pub mod request;
