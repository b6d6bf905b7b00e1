use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::row_mapping::RowError;
use crate::core::auth::AuthError;

/// Orientation of a value grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MajorDimension {
    #[serde(rename = "ROWS")]
    Rows,
    #[serde(rename = "COLUMNS")]
    Columns,
    #[serde(rename = "DIMENSION_UNSPECIFIED")]
    Unspecified,
}

impl MajorDimension {
    /// Guesses the orientation of an update from its shape: `Rows` when there
    /// are no more rows than cells in the first row, `Columns` otherwise.
    ///
    /// This is a weak heuristic (a tall single-column write is sent as
    /// `Columns`), kept because existing sheets were written this way. Use
    /// `SpreadsheetManager::update_range_with_dimension` to be explicit.
    pub fn infer(values: &[Vec<String>]) -> Self {
        match values.first() {
            Some(first) if values.len() > first.len() => MajorDimension::Columns,
            _ => MajorDimension::Rows,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MajorDimension::Rows => "ROWS",
            MajorDimension::Columns => "COLUMNS",
            MajorDimension::Unspecified => "DIMENSION_UNSPECIFIED",
        }
    }
}

/// The Sheets API `ValueRange` envelope, used both for reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub major_dimension: MajorDimension,
    pub values: Vec<Vec<String>>,
}

/// A range read back from the sheet with every row mapped to `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetData<T> {
    pub range: String,
    pub major_dimension: MajorDimension,
    pub values: Vec<T>,
}

/// Errors raised by spreadsheet reads and writes.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("failed to obtain access token: {0}")]
    Auth(#[from] AuthError),
    #[error("spreadsheet API returned {status}: {body}")]
    RemoteApi { status: u16, body: String },
    /// The body was JSON but did not have the expected shape.
    #[error("spreadsheet response is missing or has an invalid `{0}`")]
    MalformedResponse(String),
    /// The body could not be read as JSON at all.
    #[error("could not decode spreadsheet response: {0}")]
    Decode(String),
    #[error("network error talking to spreadsheet API: {0}")]
    Network(String),
    #[error("spreadsheet request timed out")]
    Timeout,
    #[error("could not build spreadsheet request: {0}")]
    RequestBuild(String),
    #[error("row {row} could not be mapped: {source}")]
    Mapping {
        row: usize,
        #[source]
        source: RowError,
    },
}
