//! Bounded queue of character chunks over a sequential source
//!
//! The store never holds the whole input: chunks are appended on demand
//! while a separator is being searched for and dropped once extraction has
//! moved the cursor past them.
//!
//! The cursor always sits in the front chunk, so chunk indices handed out by
//! the scanner are relative to it and stay valid until the next extraction.

use super::decoder::{CharDecoder, Encoding};
use crate::error::Result;
use std::collections::VecDeque;
use std::io::Read;

/// One buffer filled by a single refill
#[derive(Debug)]
pub(crate) struct Chunk {
    data: Vec<char>,
}

impl Chunk {
    /// Number of characters actually filled
    pub(crate) fn valid_len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn as_slice(&self) -> &[char] {
        &self.data
    }
}

/// Logical position in the buffered data: chunk index and offset in it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Position {
    pub(crate) chunk: usize,
    pub(crate) offset: usize,
}

pub(crate) struct ChunkStore<R> {
    decoder: CharDecoder<R>,
    chunks: VecDeque<Chunk>,
    spare: Option<Vec<char>>,
    capacity: usize,
    cursor: usize,
    exhausted: bool,
    consumed: u64,
}

impl<R: Read> ChunkStore<R> {
    pub(crate) fn new(source: R, encoding: Encoding, capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        ChunkStore {
            decoder: CharDecoder::new(source, encoding),
            chunks: VecDeque::new(),
            spare: None,
            capacity,
            cursor: 0,
            exhausted: false,
            consumed: 0,
        }
    }

    /// Read up to `capacity` characters into a new chunk.
    ///
    /// Returns `false` once the source yields no more data. Read failures
    /// are not retried.
    pub(crate) fn refill(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let mut data = self
            .spare
            .take()
            .unwrap_or_else(|| Vec::with_capacity(self.capacity));
        data.clear();

        let read = self.decoder.read_chars(&mut data, self.capacity)?;
        if read == 0 {
            log::trace!("source exhausted after {} chars", self.consumed);
            self.exhausted = true;
            self.spare = Some(data);
            return Ok(false);
        }
        self.chunks.push_back(Chunk { data });
        log::trace!(
            "refilled {} chars, {} chunk(s) buffered",
            read,
            self.chunks.len()
        );
        Ok(true)
    }

    pub(crate) fn cursor(&self) -> Position {
        Position {
            chunk: 0,
            offset: self.cursor,
        }
    }

    pub(crate) fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Characters moved past the cursor so far
    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }

    #[cfg(test)]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Character at `pos`, `None` when `pos` lies beyond the buffered data
    pub(crate) fn char_at(&self, pos: Position) -> Option<char> {
        self.chunks
            .get(pos.chunk)
            .and_then(|chunk| chunk.data.get(pos.offset))
            .copied()
    }

    /// Position one character after `pos`, rolling into the next chunk.
    ///
    /// Landing exactly on a chunk's valid length yields `(next_chunk, 0)`.
    pub(crate) fn step(&self, pos: Position) -> Position {
        self.normalize(Position {
            chunk: pos.chunk,
            offset: pos.offset + 1,
        })
    }

    pub(crate) fn normalize(&self, mut pos: Position) -> Position {
        while let Some(chunk) = self.chunks.get(pos.chunk) {
            if pos.offset < chunk.valid_len() {
                break;
            }
            pos.offset -= chunk.valid_len();
            pos.chunk += 1;
        }
        pos
    }

    /// Move the cursor to `pos` and retire every chunk left behind
    pub(crate) fn advance_to(&mut self, pos: Position) {
        let pos = self.normalize(pos);
        let mut moved = 0usize;
        for index in 0..pos.chunk {
            let len = self.chunks[index].valid_len();
            moved += if index == 0 { len - self.cursor } else { len };
        }
        moved = if pos.chunk == 0 {
            pos.offset - self.cursor
        } else {
            moved + pos.offset
        };
        for _ in 0..pos.chunk.min(self.chunks.len()) {
            self.retire_front();
        }
        self.cursor = pos.offset;
        self.consumed += moved as u64;
    }

    /// Drop everything buffered and reset the cursor
    pub(crate) fn clear(&mut self) {
        let mut moved = 0usize;
        for (index, chunk) in self.chunks.iter().enumerate() {
            moved += if index == 0 {
                chunk.valid_len() - self.cursor
            } else {
                chunk.valid_len()
            };
        }
        while !self.chunks.is_empty() {
            self.retire_front();
        }
        self.cursor = 0;
        self.consumed += moved as u64;
    }

    pub(crate) fn into_inner(self) -> R {
        self.decoder.into_inner()
    }

    fn retire_front(&mut self) {
        if let Some(chunk) = self.chunks.pop_front() {
            self.spare = Some(chunk.data);
        }
    }
}
