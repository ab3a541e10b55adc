//! # sepstream
//!
//! Streaming reader for delimited text with configurable, multi-character
//! field and record separators.
//!
//! ## Features
//!
//! - **Bounded memory**: input is read through fixed-capacity chunks, only
//!   the text of the record being tokenized stays buffered
//! - **Any separators**: `","`, `"||"`, `"{EOL}"`, `"\r\n"`: any non-empty
//!   string works for fields and records
//! - **Quoted values**: a column whose first value is wrapped in `"` may
//!   contain either separator
//! - **Header mapping**: every record maps column name to value in header order
//!
//! ## Quick Start
//!
//! ```
//! use sepstream::CsvReaderBuilder;
//!
//! let data = "name,city\nAlice,\"Portland, OR\"\nBob,Denver\n";
//! let mut reader = CsvReaderBuilder::new()
//!     .record_separator("\n")
//!     .from_reader(data.as_bytes())?;
//!
//! while let Some(record) = reader.read_record()? {
//!     println!("{} lives in {}", &record["name"], &record["city"]);
//! }
//! assert_eq!(reader.record_count(), 2);
//! # Ok::<(), sepstream::CsvError>(())
//! ```

pub mod csv;
pub mod csv_reader;
pub mod error;
pub mod types;

pub use csv::Encoding;
pub use csv_reader::{
    CsvReader, CsvReaderBuilder, CsvRecordIntoIter, CsvRecordIterator, DEFAULT_CHUNK_CAPACITY,
    DEFAULT_FIELD_SEPARATOR, DEFAULT_RECORD_SEPARATOR,
};
pub use error::{CsvError, Result};
pub use types::{ColumnSpec, Quoting, Record};
