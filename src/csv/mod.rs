//! Streaming engine for delimited records
//!
//! Layers, leaves first: the decoder turns bytes into characters, the chunk
//! store buffers them in fixed-capacity chunks, the scanner and extractor
//! find and cut out text between separators, and the header resolver and
//! record tokenizer turn that text into records.

mod chunk_store;
mod decoder;
mod extractor;
mod header;
mod scanner;
mod tokenizer;

pub use decoder::Encoding;

pub(crate) use chunk_store::ChunkStore;
pub(crate) use header::resolve as resolve_header;
pub(crate) use tokenizer::{RecordTokenizer, Separators};
