//! Conversion of fetched source text into destination cells.
//!
//! Drivers hand every value back as character data. Each cell is shaped for
//! its column's storage class; text that does not parse as the expected
//! number is kept as `TEXT` (the destination is dynamically typed) rather than
//! failing the batch. Temporal text is never reformatted.

use mirror_core::{CellValue, StorageType};

/// Convert raw fetched bytes (`None` for SQL NULL) into a cell.
pub fn bytes_to_cell(raw: Option<&[u8]>, storage: StorageType) -> CellValue {
    let Some(bytes) = raw else {
        return CellValue::Null;
    };

    match storage {
        StorageType::Blob => decode_binary_text(&String::from_utf8_lossy(bytes))
            .unwrap_or_else(|| CellValue::Blob(bytes.to_vec())),
        _ => text_to_cell(Some(&String::from_utf8_lossy(bytes)), storage),
    }
}

/// Convert fetched UTF-16 text (`None` for SQL NULL) into a cell.
pub fn wide_to_cell(raw: Option<&[u16]>, storage: StorageType) -> CellValue {
    let text = raw.map(String::from_utf16_lossy);
    text_to_cell(text.as_deref(), storage)
}

/// Convert fetched text (`None` for SQL NULL) into a cell.
pub fn text_to_cell(text: Option<&str>, storage: StorageType) -> CellValue {
    let Some(s) = text else {
        return CellValue::Null;
    };

    match storage {
        StorageType::Integer => parse_integer(s).unwrap_or_else(|| CellValue::Text(s.to_string())),
        StorageType::Real => parse_real(s).unwrap_or_else(|| CellValue::Text(s.to_string())),
        StorageType::Blob => {
            decode_binary_text(s).unwrap_or_else(|| CellValue::Blob(s.as_bytes().to_vec()))
        }
        StorageType::Text => CellValue::Text(s.to_string()),
    }
}

fn parse_integer(s: &str) -> Option<CellValue> {
    let trimmed = s.trim();
    match trimmed {
        "true" | "True" | "TRUE" | "Y" | "y" => return Some(CellValue::Integer(1)),
        "false" | "False" | "FALSE" | "N" | "n" => return Some(CellValue::Integer(0)),
        _ => {}
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(CellValue::Integer(v));
    }
    // Unsigned BIGINT beyond i64 would only survive as a rounded REAL
    let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Some drivers render integer columns as "42.0"
    let f = parse_finite(trimmed)?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(CellValue::Integer(f as i64))
    } else {
        Some(CellValue::Real(f))
    }
}

fn parse_real(s: &str) -> Option<CellValue> {
    // Money types may carry currency symbols and thousands separators
    let cleaned = s.trim().replace(['$', ','], "");
    parse_finite(&cleaned).map(CellValue::Real)
}

/// SQLite stores NaN as NULL, so only finite values become `REAL`.
fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Binary columns read as character data arrive hex encoded, optionally
/// with a `0x` prefix.
fn decode_binary_text(s: &str) -> Option<CellValue> {
    let hex_str = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(hex_str).ok().map(CellValue::Blob)
}
