use std::str::FromStr;
use thiserror::Error;

/// Why a raw row could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("missing column {index} ({field})")]
    MissingColumn { index: usize, field: &'static str },
    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Records that can be built from one spreadsheet row.
///
/// Implementations must fail rather than coerce when a cell does not fit
/// the field type. The spreadsheet layer never looks inside the record.
pub trait FromRow: Sized {
    fn from_row(row: &[String]) -> Result<Self, RowError>;
}

/// Returns the cell at `index`, or `MissingColumn` when the row is short.
pub fn cell<'a>(row: &'a [String], index: usize, field: &'static str) -> Result<&'a str, RowError> {
    row.get(index)
        .map(String::as_str)
        .ok_or(RowError::MissingColumn { index, field })
}

/// Parses the cell at `index` into `T`. Surrounding whitespace is ignored.
pub fn parse_cell<T>(row: &[String], index: usize, field: &'static str) -> Result<T, RowError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = cell(row, index, field)?;
    raw.trim().parse().map_err(|e: T::Err| RowError::InvalidValue {
        field,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
