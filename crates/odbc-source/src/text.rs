//! Character buffers every source column is fetched into.
//!
//! Narrow ODBC text arrives in the client code page. unixODBC setups use
//! UTF-8, but Windows driver managers return the ANSI code page, so Windows
//! builds bind UTF-16 buffers instead.

use mirror_core::{CellValue, SourceError, StorageType};
use odbc_api::buffers::{ColumnarBuffer, TextColumn};
use std::mem::size_of;

#[cfg(not(windows))]
pub(crate) type TextUnit = u8;
#[cfg(windows)]
pub(crate) type TextUnit = u16;

pub(crate) type TextRows = ColumnarBuffer<TextColumn<TextUnit>>;

/// Worst-case buffer units per character
#[cfg(not(windows))]
pub(crate) const UNITS_PER_CHAR: usize = 4;
#[cfg(windows)]
pub(crate) const UNITS_PER_CHAR: usize = 2;

/// Allocate `capacity` rows with one text column per entry of `widths`,
/// each holding up to that many units.
pub(crate) fn text_rows(capacity: usize, widths: &[usize]) -> Result<TextRows, SourceError> {
    let columns = widths
        .iter()
        .enumerate()
        .map(|(idx, &width)| {
            TextColumn::try_new(capacity, width)
                .map(|column| (idx as u16 + 1, column))
                .map_err(|e| {
                    SourceError::Query(format!(
                        "Failed to allocate buffer for column {}: {e:?}",
                        idx + 1
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ColumnarBuffer::new(columns))
}

/// Buffer bytes one row of `widths` occupies, including terminators and
/// length indicators.
pub(crate) fn row_bytes(widths: &[usize]) -> usize {
    widths
        .iter()
        .map(|width| (width + 1) * size_of::<TextUnit>() + size_of::<isize>())
        .sum()
}

#[cfg(not(windows))]
pub(crate) fn decode(raw: &[TextUnit]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(windows)]
pub(crate) fn decode(raw: &[TextUnit]) -> String {
    String::from_utf16_lossy(raw)
}

#[cfg(not(windows))]
pub(crate) fn to_cell(raw: Option<&[TextUnit]>, storage: StorageType) -> CellValue {
    odbc_types::bytes_to_cell(raw, storage)
}

#[cfg(windows)]
pub(crate) fn to_cell(raw: Option<&[TextUnit]>, storage: StorageType) -> CellValue {
    odbc_types::wide_to_cell(raw, storage)
}
