//! Incremental byte to character decoding

use std::io::{self, Read};

const READ_BLOCK: usize = 8 * 1024;

/// Character encoding of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8, multi-byte sequences may be split across source reads
    #[default]
    Utf8,
    /// ISO-8859-1, one byte per character
    Latin1,
}

/// Turns a byte source into characters, a bounded amount at a time.
///
/// Bytes belonging to an incomplete UTF-8 sequence are kept until the next
/// source read completes them.
pub(crate) struct CharDecoder<R> {
    source: R,
    encoding: Encoding,
    pending: Vec<u8>,
    start: usize,
    eof: bool,
}

impl<R: Read> CharDecoder<R> {
    pub(crate) fn new(source: R, encoding: Encoding) -> Self {
        CharDecoder {
            source,
            encoding,
            pending: Vec::with_capacity(READ_BLOCK),
            start: 0,
            eof: false,
        }
    }

    /// Append up to `max` characters to `out`.
    ///
    /// Blocks on the source only while nothing has been decoded yet.
    /// Returns `Ok(0)` once the source is exhausted.
    pub(crate) fn read_chars(&mut self, out: &mut Vec<char>, max: usize) -> io::Result<usize> {
        let mut produced = 0;
        while produced < max {
            produced += self.decode_pending(out, max - produced)?;
            if produced == max {
                break;
            }
            if self.eof {
                if self.start < self.pending.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "stream ended inside a UTF-8 sequence",
                    ));
                }
                break;
            }
            if produced > 0 {
                break;
            }
            self.fill()?;
        }
        Ok(produced)
    }

    pub(crate) fn into_inner(self) -> R {
        self.source
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.pending.drain(..self.start);
            self.start = 0;
        }
        let mut block = [0u8; READ_BLOCK];
        loop {
            match self.source.read(&mut block) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.pending.extend_from_slice(&block[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn decode_pending(&mut self, out: &mut Vec<char>, max: usize) -> io::Result<usize> {
        let available = &self.pending[self.start..];
        if available.is_empty() || max == 0 {
            return Ok(0);
        }
        match self.encoding {
            Encoding::Latin1 => {
                let n = available.len().min(max);
                out.extend(available[..n].iter().map(|&b| char::from(b)));
                self.start += n;
                Ok(n)
            }
            Encoding::Utf8 => {
                // `max` chars never span more than `max * 4` bytes; a sequence
                // cut by the window is treated like an incomplete tail
                let window = &available[..available.len().min(max.saturating_mul(4))];
                let valid = match std::str::from_utf8(window) {
                    Ok(text) => text,
                    Err(e) if e.valid_up_to() == 0 && e.error_len().is_some() => {
                        return Err(io::Error::new(io::ErrorKind::InvalidData, e));
                    }
                    // Decode the valid prefix; an incomplete tail waits for more bytes
                    Err(e) => std::str::from_utf8(&window[..e.valid_up_to()])
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
                };
                let mut count = 0;
                let mut consumed = valid.len();
                for (idx, ch) in valid.char_indices() {
                    if count == max {
                        consumed = idx;
                        break;
                    }
                    out.push(ch);
                    count += 1;
                }
                self.start += consumed;
                Ok(count)
            }
        }
    }
}
