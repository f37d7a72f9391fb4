//! Spreadsheet grid reading.
//!
//! Uploaded files are decoded into [`Sheet`]s: named sequences of
//! [`GridRow`]s holding plain string cells. Nothing here interprets the
//! cells; header resolution and aggregation happen downstream.
//!
//! # Formats
//!
//! - **Workbooks**: legacy and modern binary spreadsheet formats, detected
//!   from the bytes themselves ([`WorkbookReader`])
//! - **Delimited text**: comma, semicolon or tab separated files
//!   ([`DelimitedReader`])
//!
//! [`SpreadsheetReader`] picks between the two from the file name.

mod delimited;
mod error;
mod grid;
mod reader;
mod workbook;

pub use delimited::DelimitedReader;
pub use error::{IngestError, Result};
pub use grid::{GridRow, Sheet};
pub use reader::{GridSource, SpreadsheetReader};
pub use workbook::{DEFAULT_CELL_DATE_FORMAT, WorkbookReader};
