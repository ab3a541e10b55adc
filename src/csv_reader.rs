//! Delimited-record reading with a bounded lookahead buffer

use crate::csv::{resolve_header, ChunkStore, Encoding, RecordTokenizer, Separators};
use crate::error::{CsvError, Result};
use crate::types::{ColumnSpec, Record};
use std::fs::File;
use std::io::Read;
use std::iter::FusedIterator;
use std::path::Path;

/// Default chunk capacity, in characters
pub const DEFAULT_CHUNK_CAPACITY: usize = 16 * 1024;

/// Default record separator: the platform line terminator
#[cfg(windows)]
pub const DEFAULT_RECORD_SEPARATOR: &str = "\r\n";
/// Default record separator: the platform line terminator
#[cfg(not(windows))]
pub const DEFAULT_RECORD_SEPARATOR: &str = "\n";

/// Default field separator
pub const DEFAULT_FIELD_SEPARATOR: &str = ",";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Records,
    Finished,
    Failed,
}

/// Streaming reader for delimited records with a header line
///
/// Column names come from the first line. Every following line is returned
/// as a [`Record`] mapping column name to value. Input is read through a
/// queue of fixed-capacity chunks, so memory use is bounded by the longest
/// record rather than by the input size.
///
/// Field and record separators may be any non-empty string. A value may be
/// wrapped in double quotes, in which case it may contain either separator.
/// Doubled quotes inside a value are not unescaped.
///
/// # Examples
///
/// ```
/// use sepstream::CsvReader;
///
/// let data = "city,country\nBoston,United States\nConcord,United States\n";
/// let mut reader = CsvReader::new(data.as_bytes());
///
/// for record in reader.records() {
///     let record = record.unwrap();
///     assert_eq!(record.get("country"), Some("United States"));
/// }
/// assert_eq!(reader.record_count(), 2);
/// ```
///
/// # Custom separators
///
/// ```
/// use sepstream::CsvReaderBuilder;
///
/// let data = "id||name{EOL}1||\"Smith || Sons\"{EOL}";
/// let mut reader = CsvReaderBuilder::new()
///     .field_separator("||")
///     .record_separator("{EOL}")
///     .from_reader(data.as_bytes())
///     .unwrap();
///
/// let record = reader.read_record().unwrap().unwrap();
/// assert_eq!(&record["name"], "Smith || Sons");
/// assert!(reader.read_record().unwrap().is_none());
/// ```
pub struct CsvReader<R> {
    store: ChunkStore<R>,
    separators: Separators,
    tokenizer: Option<RecordTokenizer>,
    phase: Phase,
    pending: Option<Record>,
    record_count: u64,
    header_position: Option<u64>,
}

impl<R: Read> CsvReader<R> {
    /// Create a reader with the default configuration
    pub fn new(source: R) -> Self {
        let builder = CsvReaderBuilder::new();
        CsvReader::with_config(source, &builder)
    }

    fn with_config(source: R, config: &CsvReaderBuilder) -> Self {
        log::debug!(
            "reader configured: record separator {:?}, field separator {:?}, {} char chunks",
            config.record_separator,
            config.field_separator,
            config.chunk_capacity
        );
        CsvReader {
            store: ChunkStore::new(source, config.encoding, config.chunk_capacity),
            separators: Separators::new(&config.record_separator, &config.field_separator),
            tokenizer: None,
            phase: Phase::Header,
            pending: None,
            record_count: 0,
            header_position: None,
        }
    }

    /// Resolve the header line now instead of on the first read
    ///
    /// Returns the column table. Calling it again returns the same table.
    pub fn resolve_headers(&mut self) -> Result<&[ColumnSpec]> {
        self.ensure_header()?;
        match self.tokenizer {
            Some(ref tokenizer) => Ok(tokenizer.columns()),
            None => Err(CsvError::InvalidState(
                "header line could not be resolved".to_string(),
            )),
        }
    }

    /// Read the next record
    ///
    /// Returns `Ok(None)` at the end of the stream, and after any error.
    ///
    /// # Examples
    ///
    /// ```
    /// use sepstream::CsvReader;
    ///
    /// let mut reader = CsvReader::new("a,b\n1,2\n".as_bytes());
    /// while let Some(record) = reader.read_record().unwrap() {
    ///     assert_eq!(record.values(), vec!["1", "2"]);
    /// }
    /// ```
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        if let Some(record) = self.pending.take() {
            return Ok(Some(record));
        }
        self.tokenize()
    }

    /// Check whether another record is available, reading it ahead
    ///
    /// The first call resolves the header. The record read here is handed
    /// out by the next [`take_record`](Self::take_record) or
    /// [`read_record`](Self::read_record).
    pub fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            self.pending = self.tokenize()?;
        }
        Ok(self.pending.is_some())
    }

    /// Take the record read ahead by [`has_next`](Self::has_next)
    ///
    /// Fails with [`CsvError::InvalidState`] when no record is pending.
    pub fn take_record(&mut self) -> Result<Record> {
        self.pending.take().ok_or_else(|| {
            CsvError::InvalidState("no pending record, call has_next first".to_string())
        })
    }

    /// Get iterator over records
    ///
    /// # Examples
    ///
    /// ```
    /// use sepstream::CsvReader;
    ///
    /// let mut reader = CsvReader::new("k,v\nx,1\ny,2".as_bytes());
    /// let keys: Vec<String> = reader
    ///     .records()
    ///     .map(|r| r.map(|r| r["k"].to_string()))
    ///     .collect::<Result<_, _>>()
    ///     .unwrap();
    /// assert_eq!(keys, vec!["x", "y"]);
    /// ```
    pub fn records(&mut self) -> CsvRecordIterator<'_, R> {
        CsvRecordIterator { reader: self }
    }

    /// Give back the underlying source
    ///
    /// Characters already buffered but not yet returned are lost.
    pub fn into_inner(self) -> R {
        self.store.into_inner()
    }

    fn ensure_header(&mut self) -> Result<()> {
        if self.phase != Phase::Header {
            return Ok(());
        }
        match resolve_header(&mut self.store, &self.separators) {
            Ok(columns) => {
                self.header_position = Some(self.store.consumed());
                self.tokenizer = Some(RecordTokenizer::new(columns, self.separators.clone()));
                self.phase = Phase::Records;
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    fn tokenize(&mut self) -> Result<Option<Record>> {
        self.ensure_header()?;
        if self.phase != Phase::Records {
            return Ok(None);
        }
        let Some(tokenizer) = self.tokenizer.as_mut() else {
            return Ok(None);
        };
        match tokenizer.next_record(&mut self.store) {
            Ok(Some(record)) => {
                self.record_count += 1;
                Ok(Some(record))
            }
            Ok(None) => {
                self.phase = Phase::Finished;
                log::debug!(
                    "end of stream after {} record(s), {} chars",
                    self.record_count,
                    self.store.consumed()
                );
                Ok(None)
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }
}

impl<R> CsvReader<R> {
    /// Column table, once the header has been resolved
    pub fn columns(&self) -> Option<&[ColumnSpec]> {
        self.tokenizer.as_ref().map(RecordTokenizer::columns)
    }

    /// Column names in header order, once the header has been resolved
    pub fn headers(&self) -> Option<Vec<&str>> {
        self.columns()
            .map(|columns| columns.iter().map(ColumnSpec::name).collect())
    }

    /// Characters taken by the header line including its record separator
    pub fn header_position(&self) -> Option<u64> {
        self.header_position
    }

    /// Get the number of records read so far
    pub fn record_count(&self) -> u64 {
        self.record_count
    }
}

impl CsvReader<File> {
    /// Open a file with the default configuration
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sepstream::CsvReader;
    ///
    /// let mut reader = CsvReader::open("data.csv")?;
    /// for record in reader.records() {
    ///     println!("{:?}", record?);
    /// }
    /// # Ok::<(), sepstream::CsvError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        CsvReaderBuilder::new().from_path(path)
    }
}

/// Iterator over records, borrowing the reader
pub struct CsvRecordIterator<'a, R> {
    reader: &'a mut CsvReader<R>,
}

impl<R: Read> Iterator for CsvRecordIterator<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

impl<R: Read> FusedIterator for CsvRecordIterator<'_, R> {}

/// Iterator over records, owning the reader
pub struct CsvRecordIntoIter<R> {
    reader: CsvReader<R>,
}

impl<R> CsvRecordIntoIter<R> {
    /// Give back the reader
    pub fn into_reader(self) -> CsvReader<R> {
        self.reader
    }
}

impl<R: Read> Iterator for CsvRecordIntoIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

impl<R: Read> FusedIterator for CsvRecordIntoIter<R> {}

impl<R: Read> IntoIterator for CsvReader<R> {
    type Item = Result<Record>;
    type IntoIter = CsvRecordIntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        CsvRecordIntoIter { reader: self }
    }
}

/// Configuration for a [`CsvReader`] (builder pattern)
///
/// Settings are validated when the reader is built, before any input is read.
///
/// # Default Configuration
///
/// - Encoding: UTF-8
/// - Record separator: platform line terminator
/// - Field separator: comma (`,`)
/// - Chunk capacity: [`DEFAULT_CHUNK_CAPACITY`] characters
///
/// # Examples
///
/// ```
/// use sepstream::{CsvReaderBuilder, Encoding};
///
/// let _reader = CsvReaderBuilder::new()
///     .encoding(Encoding::Latin1)
///     .field_separator(";")
///     .record_separator("\r\n")
///     .chunk_capacity(4096)
///     .from_reader(&b"a;b\r\n1;2\r\n"[..])
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct CsvReaderBuilder {
    encoding: Encoding,
    record_separator: String,
    field_separator: String,
    chunk_capacity: usize,
}

impl Default for CsvReaderBuilder {
    fn default() -> Self {
        CsvReaderBuilder {
            encoding: Encoding::default(),
            record_separator: DEFAULT_RECORD_SEPARATOR.to_string(),
            field_separator: DEFAULT_FIELD_SEPARATOR.to_string(),
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
        }
    }
}

impl CsvReaderBuilder {
    /// Create a builder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character encoding of the source
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the string separating records (lines)
    pub fn record_separator(mut self, separator: &str) -> Self {
        self.record_separator = separator.to_string();
        self
    }

    /// Set the string separating fields within a record
    pub fn field_separator(mut self, separator: &str) -> Self {
        self.field_separator = separator.to_string();
        self
    }

    /// Set how many characters one chunk holds
    pub fn chunk_capacity(mut self, capacity: usize) -> Self {
        self.chunk_capacity = capacity;
        self
    }

    /// Build a reader over any byte source
    pub fn from_reader<R: Read>(self, source: R) -> Result<CsvReader<R>> {
        self.validate()?;
        Ok(CsvReader::with_config(source, &self))
    }

    /// Build a reader over a file
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvReader<File>> {
        self.validate()?;
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CsvError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(CsvReader::with_config(file, &self))
    }

    fn validate(&self) -> Result<()> {
        if self.record_separator.is_empty() {
            return Err(CsvError::Config(
                "record separator must not be empty".to_string(),
            ));
        }
        if self.field_separator.is_empty() {
            return Err(CsvError::Config(
                "field separator must not be empty".to_string(),
            ));
        }
        if self.chunk_capacity == 0 {
            return Err(CsvError::Config(
                "chunk capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
