//! Record tokenizer: splits the stream into fields column by column
//!
//! For every column the tokenizer searches for the column's end delimiter:
//! the field separator, or the record separator for the last column. The
//! first value seen for a column decides whether the column is quoted; a
//! quoted column then ends at `"` followed by the separator, which lets the
//! value itself contain either separator.

use super::chunk_store::ChunkStore;
use crate::error::{CsvError, Result};
use crate::types::{ColumnSpec, Quoting, Record, QUOTE};
use std::io::Read;

/// Field and record separators, with their quote-qualified forms
#[derive(Debug, Clone)]
pub(crate) struct Separators {
    field: String,
    record: String,
    field_chars: Vec<char>,
    record_chars: Vec<char>,
    quoted_field: Vec<char>,
    quoted_record: Vec<char>,
}

impl Separators {
    pub(crate) fn new(record: &str, field: &str) -> Self {
        let quoted =
            |sep: &str| -> Vec<char> { std::iter::once(QUOTE).chain(sep.chars()).collect() };
        Separators {
            field: field.to_string(),
            record: record.to_string(),
            field_chars: field.chars().collect(),
            record_chars: record.chars().collect(),
            quoted_field: quoted(field),
            quoted_record: quoted(record),
        }
    }

    pub(crate) fn field(&self) -> &str {
        &self.field
    }

    pub(crate) fn record(&self) -> &str {
        &self.record
    }

    pub(crate) fn record_chars(&self) -> &[char] {
        &self.record_chars
    }

    /// Separator following a column
    fn plain(&self, last: bool) -> &str {
        if last {
            &self.record
        } else {
            &self.field
        }
    }

    fn end_chars(&self, last: bool, quoting: Quoting) -> &[char] {
        match (last, quoting) {
            (false, Quoting::Plain) => &self.field_chars,
            (true, Quoting::Plain) => &self.record_chars,
            (false, Quoting::Quoted) => &self.quoted_field,
            (true, Quoting::Quoted) => &self.quoted_record,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    AtColumn(usize),
    Done,
    Malformed,
}

/// Outcome of reading one field
enum Field {
    /// Value terminated by its delimiter
    Value(String),
    /// Last value of an unterminated final record
    Final(String),
    /// No further record starts here
    Exhausted,
    /// A column in the middle of the record never ended; holds the text
    /// already taken for it
    Missing(String),
}

pub(crate) struct RecordTokenizer {
    columns: Vec<ColumnSpec>,
    separators: Separators,
    state: State,
}

impl RecordTokenizer {
    pub(crate) fn new(columns: Vec<ColumnSpec>, separators: Separators) -> Self {
        let state = if columns.is_empty() {
            State::Done
        } else {
            State::AtColumn(0)
        };
        RecordTokenizer {
            columns,
            separators,
            state,
        }
    }

    pub(crate) fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    #[cfg(test)]
    fn state(&self) -> State {
        self.state
    }

    /// Tokenize the next record, `Ok(None)` once the stream is exhausted
    pub(crate) fn next_record<R: Read>(
        &mut self,
        store: &mut ChunkStore<R>,
    ) -> Result<Option<Record>> {
        let mut record = Record::with_capacity(self.columns.len());
        loop {
            let index = match self.state {
                State::AtColumn(index) => index,
                State::Done | State::Malformed => return Ok(None),
            };
            let last = index + 1 == self.columns.len();
            let field = match self.field(store, index, last) {
                Ok(field) => field,
                Err(e) => {
                    self.state = State::Malformed;
                    return Err(e);
                }
            };
            let name = self.columns[index].name();
            match field {
                Field::Value(value) => {
                    record.insert(name, value);
                    if last {
                        self.state = State::AtColumn(0);
                        return Ok(Some(record));
                    }
                    self.state = State::AtColumn(index + 1);
                }
                Field::Final(value) => {
                    record.insert(name, value);
                    self.state = State::Done;
                    return Ok(Some(record));
                }
                Field::Exhausted => {
                    self.state = State::Done;
                    return Ok(None);
                }
                Field::Missing(partial) => {
                    self.state = State::Malformed;
                    let mut line = record.values().join(self.separators.field());
                    line.push_str(self.separators.field());
                    line.push_str(&partial);
                    line.push_str(&store.buffered_text());
                    log::warn!("column {:?} is not terminated, aborting", name);
                    return Err(CsvError::MalformedRecord {
                        column: name.to_string(),
                        line,
                    });
                }
            }
        }
    }

    fn field<R: Read>(
        &mut self,
        store: &mut ChunkStore<R>,
        index: usize,
        last: bool,
    ) -> Result<Field> {
        let Some(quoting) = self.columns[index].quoting() else {
            return self.first_field(store, index, last);
        };
        // The opening quote must not take part in the search for `"<sep>`
        let opened = quoting == Quoting::Quoted && store.skip_char(QUOTE)?;
        let end = self.separators.end_chars(last, quoting);
        match store.scan(end)? {
            Some(found) => Ok(Field::Value(store.extract(found))),
            None => {
                let head = opened.then(String::new);
                Ok(self.not_found(store, index, last, head))
            }
        }
    }

    /// Read the first value of a column and learn its delimiter shape
    fn first_field<R: Read>(
        &mut self,
        store: &mut ChunkStore<R>,
        index: usize,
        last: bool,
    ) -> Result<Field> {
        let plain = self.separators.plain(last).to_string();
        let Some(found) = store.scan(self.separators.end_chars(last, Quoting::Plain))? else {
            return Ok(self.not_found(store, index, last, None));
        };
        let value = store.extract(found);
        if !value.starts_with(QUOTE) {
            self.learn(index, Quoting::Plain, &plain);
            return Ok(Field::Value(value));
        }

        self.learn(index, Quoting::Quoted, &plain);
        if value.len() >= 2 && value.ends_with(QUOTE) {
            return Ok(Field::Value(value[1..value.len() - 1].to_string()));
        }
        // The separator just found sits inside the quotes
        let head = format!("{}{}", &value[1..], plain);
        match store.scan(self.separators.end_chars(last, Quoting::Quoted))? {
            Some(found) => Ok(Field::Value(head + &store.extract(found))),
            None => Ok(self.not_found(store, index, last, Some(head))),
        }
    }

    /// Decide what a missing delimiter means for column `index`
    fn not_found<R: Read>(
        &mut self,
        store: &mut ChunkStore<R>,
        index: usize,
        last: bool,
        head: Option<String>,
    ) -> Field {
        if !last {
            if index == 0 {
                let rest = store.extract_to_end();
                if !rest.is_empty() {
                    log::debug!(
                        "discarding {} unterminated trailing char(s)",
                        rest.chars().count()
                    );
                }
                return Field::Exhausted;
            }
            let partial = head.map(|head| format!("{}{}", QUOTE, head));
            return Field::Missing(partial.unwrap_or_default());
        }

        let rest = store.extract_to_end();
        if let Some(head) = head {
            let value = head + &rest;
            return Field::Final(strip_suffix_quote(value));
        }
        if index == 0 && rest.is_empty() {
            return Field::Exhausted;
        }
        let plain = self.separators.plain(last).to_string();
        let quoting = match self.columns[index].quoting() {
            Some(quoting) => quoting,
            None => {
                let wrapped = rest.len() >= 2 && rest.starts_with(QUOTE) && rest.ends_with(QUOTE);
                let quoting = if wrapped {
                    Quoting::Quoted
                } else {
                    Quoting::Plain
                };
                self.learn(index, quoting, &plain);
                quoting
            }
        };
        match quoting {
            Quoting::Plain => Field::Final(rest),
            Quoting::Quoted => {
                Field::Final(strip_suffix_quote(strip_prefix_quote(rest)))
            }
        }
    }

    fn learn(&mut self, index: usize, quoting: Quoting, separator: &str) {
        let column = &mut self.columns[index];
        column.learn(quoting, separator);
        log::debug!("column {:?} inferred as {:?}", column.name(), quoting);
    }
}

fn strip_prefix_quote(value: String) -> String {
    match value.strip_prefix(QUOTE) {
        Some(stripped) => stripped.to_string(),
        None => value,
    }
}

fn strip_suffix_quote(value: String) -> String {
    match value.strip_suffix(QUOTE) {
        Some(stripped) => stripped.to_string(),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::decoder::Encoding;
    use crate::csv::header;

    struct Fixture {
        store: ChunkStore<&'static [u8]>,
        tokenizer: RecordTokenizer,
    }

    fn fixture(input: &'static str, record: &str, field: &str, capacity: usize) -> Fixture {
        let mut store = ChunkStore::new(input.as_bytes(), Encoding::Utf8, capacity);
        let separators = Separators::new(record, field);
        let columns = header::resolve(&mut store, &separators).unwrap();
        Fixture {
            store,
            tokenizer: RecordTokenizer::new(columns, separators),
        }
    }

    impl Fixture {
        fn next(&mut self) -> Option<Vec<(String, String)>> {
            self.tokenizer
                .next_record(&mut self.store)
                .unwrap()
                .map(|r| r.into_iter().collect())
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_two_records_then_done() {
        for capacity in [1, 2, 5, 64] {
            let mut f = fixture("col1,col2\nv1,v2\nv3,v4\n", "\n", ",", capacity);
            assert_eq!(f.next(), Some(pairs(&[("col1", "v1"), ("col2", "v2")])));
            assert_eq!(f.next(), Some(pairs(&[("col1", "v3"), ("col2", "v4")])));
            assert_eq!(f.next(), None);
            assert_eq!(f.tokenizer.state(), State::Done);
            assert_eq!(f.next(), None);
        }
    }

    #[test]
    fn test_final_record_without_terminator() {
        let mut f = fixture("col1,col2\nv1,v2\nv5,v6", "\n", ",", 3);
        assert!(f.next().is_some());
        assert_eq!(f.next(), Some(pairs(&[("col1", "v5"), ("col2", "v6")])));
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_quoted_last_column_with_field_separator() {
        let mut f = fixture("col1,col2\nv1,\"a,b\"\n", "\n", ",", 4);
        assert_eq!(f.next(), Some(pairs(&[("col1", "v1"), ("col2", "a,b")])));
        assert_eq!(f.next(), None);
        assert_eq!(f.tokenizer.columns()[1].end_delimiter(), "\"\n");
    }

    #[test]
    fn test_quoted_values_containing_both_separators() {
        let input = "col1,col2|||\"x ||| 1, y\",\"z ||| 2\"|||\"p, q\",\"r|||s\"|||";
        for capacity in [1, 4, 7, 256] {
            let mut f = fixture(input, "|||", ",", capacity);
            assert_eq!(
                f.next(),
                Some(pairs(&[("col1", "x ||| 1, y"), ("col2", "z ||| 2")]))
            );
            assert_eq!(f.next(), Some(pairs(&[("col1", "p, q"), ("col2", "r|||s")])));
            assert_eq!(f.next(), None);
        }
    }

    #[test]
    fn test_quoting_learned_once() {
        let mut f = fixture("a,b\n\"1\",2\n\"3\",4\n", "\n", ",", 2);
        assert_eq!(f.next(), Some(pairs(&[("a", "1"), ("b", "2")])));
        let col = &f.tokenizer.columns()[0];
        assert_eq!(col.quoting(), Some(Quoting::Quoted));
        assert_eq!(col.start_delimiter(), "\"");
        assert_eq!(col.end_delimiter(), "\",");
        assert_eq!(f.tokenizer.columns()[1].quoting(), Some(Quoting::Plain));
        assert_eq!(f.next(), Some(pairs(&[("a", "3"), ("b", "4")])));
    }

    #[test]
    fn test_quoted_final_record_without_terminator() {
        let mut f = fixture("a,b\n1,\"x\"\n2,\"y\"", "\n", ",", 3);
        assert_eq!(f.next(), Some(pairs(&[("a", "1"), ("b", "x")])));
        assert_eq!(f.next(), Some(pairs(&[("a", "2"), ("b", "y")])));
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_quoted_embedded_separator_in_unterminated_final_record() {
        let mut f = fixture("a,b\n1,\"x\ny\"", "\n", ",", 2);
        assert_eq!(f.next(), Some(pairs(&[("a", "1"), ("b", "x\ny")])));
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_known_quoted_column_value_starting_with_separator() {
        for capacity in [1, 2, 3, 64] {
            let mut f = fixture("a,b\n\"x\",1\n\",y\",2\n", "\n", ",", capacity);
            assert_eq!(f.next(), Some(pairs(&[("a", "x"), ("b", "1")])));
            assert_eq!(f.next(), Some(pairs(&[("a", ",y"), ("b", "2")])));
            assert_eq!(f.next(), None);

            let mut f = fixture("a,b\n1,\"x\"\n2,\"\nz\"\n", "\n", ",", capacity);
            assert_eq!(f.next(), Some(pairs(&[("a", "1"), ("b", "x")])));
            assert_eq!(f.next(), Some(pairs(&[("a", "2"), ("b", "\nz")])));
            assert_eq!(f.next(), None);
        }
    }

    #[test]
    fn test_known_quoted_last_column_in_unterminated_final_record() {
        let mut f = fixture("a,b\n1,\"x\"\n2,\"\ny\"", "\n", ",", 2);
        assert!(f.next().is_some());
        assert_eq!(f.next(), Some(pairs(&[("a", "2"), ("b", "\ny")])));
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_empty_values() {
        let mut f = fixture("a,b,c\n,,\n1,,3\n", "\n", ",", 2);
        assert_eq!(f.next(), Some(pairs(&[("a", ""), ("b", ""), ("c", "")])));
        assert_eq!(f.next(), Some(pairs(&[("a", "1"), ("b", ""), ("c", "3")])));
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_single_column() {
        let mut f = fixture("name\nalpha\nbeta\n", "\n", ",", 2);
        assert_eq!(f.next(), Some(pairs(&[("name", "alpha")])));
        assert_eq!(f.next(), Some(pairs(&[("name", "beta")])));
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_header_only() {
        let mut f = fixture("col1,col2\n", "\n", ",", 4);
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_malformed_middle_column() {
        let mut f = fixture("a,b,c\n1,2,3\n4", "\n", ",", 3);
        assert!(f.next().is_some());
        // "4" then the next "," never appears: column a ends the stream
        assert_eq!(f.next(), None);

        let mut f = fixture("a,b,c\n1,2", "\n", ",", 3);
        let err = f.tokenizer.next_record(&mut f.store).unwrap_err();
        match err {
            CsvError::MalformedRecord { column, line } => {
                assert_eq!(column, "b");
                assert_eq!(line, "1,2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(f.tokenizer.state(), State::Malformed);
        assert_eq!(f.next(), None);
    }

    #[test]
    fn test_malformed_keeps_unclosed_quoted_text() {
        let mut f = fixture("a,b,c\n1,\"x,y", "\n", ",", 2);
        match f.tokenizer.next_record(&mut f.store).unwrap_err() {
            CsvError::MalformedRecord { column, line } => {
                assert_eq!(column, "b");
                assert_eq!(line, "1,\"x,y");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // the column is already known to be quoted
        let mut f = fixture("a,b,c\n1,\"x\",3\n4,\"y,z", "\n", ",", 3);
        assert!(f.next().is_some());
        match f.tokenizer.next_record(&mut f.store).unwrap_err() {
            CsvError::MalformedRecord { line, .. } => assert_eq!(line, "4,\"y,z"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_columns() {
        let mut f = fixture(",\nx,y\n", "\n", ",", 4);
        assert!(f.tokenizer.columns().is_empty());
        assert_eq!(f.next(), None);
    }
}
