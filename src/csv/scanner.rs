//! Separator search across chunk boundaries

use super::chunk_store::{ChunkStore, Position};
use crate::error::Result;
use std::io::Read;

/// Where a separator was found, relative to the front chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FoundPosition {
    pub(crate) chunk: usize,
    pub(crate) offset: usize,
    pub(crate) separator_len: usize,
}

impl FoundPosition {
    pub(crate) fn start(&self) -> Position {
        Position {
            chunk: self.chunk,
            offset: self.offset,
        }
    }
}

impl<R: Read> ChunkStore<R> {
    /// Find the leftmost occurrence of `separator` at or after the cursor.
    ///
    /// Pulls more chunks whenever the buffered data runs out, keeping the
    /// partial match in progress. Returns `None` when the source ends first.
    /// Scanning again without an extraction in between gives the same answer.
    pub(crate) fn scan(&mut self, separator: &[char]) -> Result<Option<FoundPosition>> {
        assert!(!separator.is_empty(), "separator must not be empty");

        let mut start = self.normalize(self.cursor());
        let mut probe = start;
        let mut matched = 0;
        loop {
            let Some(ch) = self.char_at(probe) else {
                if self.refill()? {
                    continue;
                }
                return Ok(None);
            };
            if ch == separator[matched] {
                matched += 1;
                if matched == separator.len() {
                    return Ok(Some(FoundPosition {
                        chunk: start.chunk,
                        offset: start.offset,
                        separator_len: separator.len(),
                    }));
                }
                probe = self.step(probe);
            } else {
                start = self.step(start);
                probe = start;
                matched = 0;
            }
        }
    }
}
