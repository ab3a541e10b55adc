//! Copying buffered text out of the chunk store

use super::chunk_store::{ChunkStore, Position};
use super::scanner::FoundPosition;
use crate::error::Result;
use std::io::Read;

impl<R: Read> ChunkStore<R> {
    /// Copy the text between the cursor and `to`, then move the cursor past
    /// the separator found at `to`.
    ///
    /// # Panics
    ///
    /// Panics if `to` lies before the cursor or beyond the buffered data.
    /// Positions are only valid until the next extraction.
    pub(crate) fn extract(&mut self, to: FoundPosition) -> String {
        let cursor = self.cursor();
        assert!(
            to.chunk > cursor.chunk || (to.chunk == cursor.chunk && to.offset >= cursor.offset),
            "extraction target {:?} lies before the cursor {:?}",
            to,
            cursor
        );
        assert!(
            to.chunk < self.chunk_count(),
            "extraction target {:?} lies beyond the buffered data",
            to
        );

        let value = self.copy_range(cursor, to.start());
        self.advance_to(Position {
            chunk: to.chunk,
            offset: to.offset + to.separator_len,
        });
        value
    }

    /// Consume the character at the cursor when it is `ch`
    ///
    /// Refills when nothing is buffered. Returns whether a character was taken.
    pub(crate) fn skip_char(&mut self, ch: char) -> Result<bool> {
        loop {
            let cursor = self.cursor();
            match self.char_at(cursor) {
                Some(found) if found == ch => {
                    self.advance_to(Position {
                        chunk: cursor.chunk,
                        offset: cursor.offset + 1,
                    });
                    return Ok(true);
                }
                Some(_) => return Ok(false),
                None => {
                    if !self.refill()? {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Copy everything buffered after the cursor and release all chunks
    pub(crate) fn extract_to_end(&mut self) -> String {
        let value = self.buffered_text();
        self.clear();
        value
    }

    /// Copy of everything buffered after the cursor, without consuming it
    pub(crate) fn buffered_text(&self) -> String {
        let end = Position {
            chunk: self.chunk_count(),
            offset: 0,
        };
        self.copy_range(self.cursor(), end)
    }

    fn copy_range(&self, from: Position, to: Position) -> String {
        let mut out = String::new();
        for index in from.chunk..=to.chunk {
            let Some(chunk) = self.chunk(index) else {
                break;
            };
            let data = chunk.as_slice();
            let begin = if index == from.chunk { from.offset } else { 0 };
            let end = if index == to.chunk {
                to.offset
            } else {
                data.len()
            };
            out.extend(&data[begin..end]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::csv::chunk_store::ChunkStore;
    use crate::csv::decoder::Encoding;
    use crate::csv::scanner::FoundPosition;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn store(input: &str, capacity: usize) -> ChunkStore<&[u8]> {
        ChunkStore::new(input.as_bytes(), Encoding::Utf8, capacity)
    }

    #[test]
    fn test_extract_within_chunk() {
        let mut s = store("12345,678", 32);
        let found = s.scan(&chars(",")).unwrap().unwrap();
        assert_eq!(s.extract(found), "12345");
        assert_eq!(s.extract_to_end(), "678");
        assert_eq!(s.consumed(), 9);
    }

    #[test]
    fn test_extract_across_chunks_retires_them() {
        let mut s = store("1234567890{EOL}abc", 4);
        let found = s.scan(&chars("{EOL}")).unwrap().unwrap();
        assert_eq!(s.extract(found), "1234567890");
        // chunks: "1234" "5678" "90{E" "OL}a" "bc": only the tail survives
        assert_eq!(s.chunk_count(), 1);
        assert_eq!(s.buffered_text(), "a");
        assert_eq!(s.extract_to_end(), "a");
        assert_eq!(s.chunk_count(), 0);
    }

    #[test]
    fn test_separator_ending_on_chunk_boundary() {
        let mut s = store("ab,cd", 3);
        let found = s.scan(&chars(",")).unwrap().unwrap();
        assert_eq!(s.extract(found), "ab");
        assert_eq!(s.chunk_count(), 0);
        let found = s.scan(&chars("d")).unwrap().unwrap();
        assert_eq!(s.extract(found), "c");
    }

    #[test]
    fn test_empty_value_between_separators() {
        let mut s = store(",,x", 1);
        let found = s.scan(&chars(",")).unwrap().unwrap();
        assert_eq!(s.extract(found), "");
        let found = s.scan(&chars(",")).unwrap().unwrap();
        assert_eq!(s.extract(found), "");
        assert_eq!(s.scan(&chars(",")).unwrap(), None);
        assert_eq!(s.extract_to_end(), "x");
    }

    #[test]
    fn test_buffered_text_does_not_consume() {
        let mut s = store("abc", 2);
        s.refill().unwrap();
        assert_eq!(s.buffered_text(), "ab");
        assert_eq!(s.buffered_text(), "ab");
        assert_eq!(s.consumed(), 0);
    }

    #[test]
    fn test_skip_char_refills_and_retires() {
        let mut s = store("\"ab", 1);
        assert!(!s.skip_char('x').unwrap());
        assert!(s.skip_char('"').unwrap());
        assert_eq!(s.chunk_count(), 0);
        assert_eq!(s.consumed(), 1);
        assert!(!s.skip_char('"').unwrap());
        assert_eq!(s.extract_to_end(), "a");

        let mut empty = store("", 4);
        assert!(!empty.skip_char('"').unwrap());
    }

    #[test]
    #[should_panic(expected = "before the cursor")]
    fn test_stale_position_fails_loudly() {
        let mut s = store("abc,def,ghi", 64);
        let first = s.scan(&chars(",")).unwrap().unwrap();
        let _ = s.extract(first);
        let _ = s.extract(FoundPosition {
            chunk: 0,
            offset: 1,
            separator_len: 1,
        });
    }
}
