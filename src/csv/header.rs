//! Header line resolution

use super::chunk_store::ChunkStore;
use super::tokenizer::Separators;
use crate::error::{CsvError, Result};
use crate::types::ColumnSpec;
use std::io::Read;

const PREVIEW_CHARS: usize = 64;

/// Read the first line and build the column table.
///
/// Fails with [`CsvError::HeaderNotFound`] when the record separator never
/// appears in the input.
pub(crate) fn resolve<R: Read>(
    store: &mut ChunkStore<R>,
    separators: &Separators,
) -> Result<Vec<ColumnSpec>> {
    let Some(found) = store.scan(separators.record_chars())? else {
        return Err(CsvError::HeaderNotFound {
            separator: separators.record().to_string(),
            preview: store.buffered_text().chars().take(PREVIEW_CHARS).collect(),
        });
    };
    let header = store.extract(found);
    let columns: Vec<ColumnSpec> = split_header(&header, separators.field())
        .into_iter()
        .enumerate()
        .map(|(position, name)| ColumnSpec::new(position, name))
        .collect();

    log::debug!(
        "resolved {} column(s) from a {} char header",
        columns.len(),
        store.consumed()
    );
    Ok(columns)
}

/// Split a header line on runs of one or more field separators.
///
/// Names are not trimmed. A leading empty name is kept, trailing empty
/// names are dropped, and a line without any separator is a single name.
pub(crate) fn split_header<'a>(header: &'a str, separator: &str) -> Vec<&'a str> {
    if !header.contains(separator) {
        return vec![header];
    }
    let mut names: Vec<&str> = header
        .split(separator)
        .enumerate()
        .filter(|(index, name)| *index == 0 || !name.is_empty())
        .map(|(_, name)| name)
        .collect();
    while names.last().is_some_and(|name| name.is_empty()) {
        names.pop();
    }
    names
}
