use async_trait::async_trait;
use std::sync::Arc;

use super::row_mapping::FromRow;
use super::sheet_models::{MajorDimension, SheetsError, SpreadsheetData, ValueRange};
use crate::core::auth::TokenSource;

/// The two Sheets API calls the manager needs. The infra layer implements
/// this over HTTP; tests use an in-memory fake.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Reads `range`. Implementations must reject responses that lack any of
    /// `range`, `majorDimension` or `values`.
    async fn get_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<ValueRange, SheetsError>;

    /// Overwrites `body.range` with `body.values` (USER_ENTERED semantics).
    async fn update_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        body: &ValueRange,
    ) -> Result<(), SheetsError>;
}

/// Range-based reads and writes against one spreadsheet.
///
/// Nothing is cached here: every call goes to the API. The only cached
/// state in the system is the bearer token behind `TokenSource`.
pub struct SpreadsheetManager<A: SheetsApi> {
    api: A,
    tokens: Arc<dyn TokenSource>,
    spreadsheet_id: String,
}

impl<A: SheetsApi> SpreadsheetManager<A> {
    pub fn new(api: A, tokens: Arc<dyn TokenSource>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            api,
            tokens,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Reads `range` and maps every row to `T`, keeping row order.
    ///
    /// All-or-nothing: the first row that fails to map aborts the call and
    /// no records are returned.
    pub async fn get_range<T: FromRow>(&self, range: &str) -> Result<SpreadsheetData<T>, SheetsError> {
        tracing::debug!(
            range,
            spreadsheet_id = %self.spreadsheet_id,
            "Getting spreadsheet range"
        );
        let token = self.tokens.get_token().await?;
        let raw = self
            .api
            .get_values(&token, &self.spreadsheet_id, range)
            .await?;

        let values = raw
            .values
            .iter()
            .enumerate()
            .map(|(row, cells)| {
                T::from_row(cells).map_err(|source| SheetsError::Mapping { row, source })
            })
            .collect::<Result<Vec<T>, SheetsError>>()?;

        Ok(SpreadsheetData {
            range: raw.range,
            major_dimension: raw.major_dimension,
            values,
        })
    }

    /// Writes `values` to `range`, inferring the major dimension from the
    /// grid shape. An empty update is skipped without touching the network.
    pub async fn update_range(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), SheetsError> {
        let dimension = MajorDimension::infer(&values);
        self.update_range_with_dimension(range, values, dimension)
            .await
    }

    /// Like `update_range`, but with the orientation chosen by the caller.
    pub async fn update_range_with_dimension(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
        major_dimension: MajorDimension,
    ) -> Result<(), SheetsError> {
        if values.is_empty() {
            tracing::warn!(range, "No values provided for update, skipping");
            return Ok(());
        }

        tracing::debug!(
            range,
            spreadsheet_id = %self.spreadsheet_id,
            rows = values.len(),
            major_dimension = major_dimension.as_str(),
            "Updating spreadsheet range"
        );
        let token = self.tokens.get_token().await?;
        let body = ValueRange {
            range: range.to_string(),
            major_dimension,
            values,
        };

        self.api
            .update_values(&token, &self.spreadsheet_id, &body)
            .await
    }
}
