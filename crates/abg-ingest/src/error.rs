//! Error types for grid reading.

use thiserror::Error;

/// Errors raised while decoding an uploaded file into sheets.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The bytes are not a workbook in any supported format.
    #[error("could not open workbook {file}: {message}")]
    Workbook { file: String, message: String },

    /// Delimited text could not be parsed.
    #[error("could not parse delimited file {file}: {source}")]
    Delimited {
        file: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for grid reading.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::Workbook {
            file: "lab.xlsx".to_string(),
            message: "corrupt".to_string(),
        };
        assert_eq!(err.to_string(), "could not open workbook lab.xlsx: corrupt");
    }
}
