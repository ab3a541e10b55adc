//! Error types for delimited-record reading

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CsvError>;

/// Errors raised while configuring or driving a [`CsvReader`](crate::CsvReader)
///
/// None of these are retried internally. Once a read error, a missing header
/// or a malformed record has been reported the reader yields no more records.
#[derive(Error, Debug)]
pub enum CsvError {
    /// Invalid reader configuration, reported before any input is read
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The underlying source failed, or produced bytes that are not valid
    /// in the configured encoding
    #[error("Failed to read source: {0}")]
    Read(#[source] io::Error),

    /// A file could not be opened
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The record separator never appears in the input, so there is no header line
    #[error("Could not find record separator {separator:?}, header = {preview:?}")]
    HeaderNotFound {
        /// The record separator that was searched for
        separator: String,
        /// Leading part of the buffered input
        preview: String,
    },

    /// A column other than the last one was never terminated
    #[error("Could not extract a value for column {column:?}, current line = {line:?}")]
    MalformedRecord {
        /// Name of the column whose delimiter was missing
        column: String,
        /// Partially extracted line text
        line: String,
    },

    /// The reader API was used out of order
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<io::Error> for CsvError {
    fn from(err: io::Error) -> Self {
        CsvError::Read(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_carries_line() {
        let err = CsvError::MalformedRecord {
            column: "col2".to_string(),
            line: "v1,v2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("col2"));
        assert!(msg.contains("v1,v2"));
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error;

        let err = CsvError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(matches!(err, CsvError::Read(_)));
        assert_eq!(err.source().map(|e| e.to_string()), Some("gone".to_string()));
    }
}
