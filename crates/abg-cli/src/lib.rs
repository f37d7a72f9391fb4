//! Library side of the `abg` command-line tool.

pub mod logging;
pub mod workspace;
