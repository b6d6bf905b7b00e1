use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde_json::Value;

use crate::core::sheets::{MajorDimension, SheetsApi, SheetsError, ValueRange};

pub const SPREADSHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// How written values are interpreted: as if a user typed them in the UI.
const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Minimal Google Sheets REST client: the `values.get` and `values.update`
/// calls, nothing else.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, SPREADSHEETS_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `{base}/{id}/values/{range}`, with the range encoded as one path segment.
    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| SheetsError::RequestBuild(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::RequestBuild(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push(spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }

    /// Turns a non-2xx response into `RemoteApi`, otherwise returns the body.
    async fn read_body(response: Response) -> Result<String, SheetsError> {
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(SheetsError::RemoteApi {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn get_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<ValueRange, SheetsError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let body = Self::read_body(response).await?;
        let data = parse_value_range(&body)?;
        tracing::debug!(
            range = %data.range,
            rows = data.values.len(),
            "Fetched spreadsheet values"
        );
        Ok(data)
    }

    async fn update_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        body: &ValueRange,
    ) -> Result<(), SheetsError> {
        let url = self.values_url(spreadsheet_id, &body.range)?;
        let response = self
            .client
            .put(url)
            .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let reply = Self::read_body(response).await?;
        let updated_cells = serde_json::from_str::<Value>(&reply)
            .ok()
            .and_then(|v| v.get("updatedCells").and_then(Value::as_u64));
        tracing::debug!(range = %body.range, ?updated_cells, "Updated spreadsheet values");
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> SheetsError {
    if e.is_timeout() {
        SheetsError::Timeout
    } else {
        SheetsError::Network(e.to_string())
    }
}

/// Decodes a `values.get` response. All three keys must be present; an
/// absent key is reported as `MalformedResponse`, never defaulted.
fn parse_value_range(body: &str) -> Result<ValueRange, SheetsError> {
    let json: Value = serde_json::from_str(body).map_err(|e| SheetsError::Decode(e.to_string()))?;

    let field = |key: &str| {
        json.get(key).cloned().ok_or_else(|| {
            tracing::error!("Invalid get data response: missing {}", key);
            SheetsError::MalformedResponse(key.to_string())
        })
    };

    let range = field("range")?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SheetsError::MalformedResponse("range".to_string()))?;
    let major_dimension: MajorDimension = serde_json::from_value(field("majorDimension")?)
        .map_err(|_| SheetsError::MalformedResponse("majorDimension".to_string()))?;
    let values: Vec<Vec<String>> = serde_json::from_value(field("values")?)
        .map_err(|_| SheetsError::MalformedResponse("values".to_string()))?;

    Ok(ValueRange {
        range,
        major_dimension,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::google::http_client;
    use crate::infra::google::test_server::serve_once;
    use std::time::Duration;

    fn client(base: &str, timeout: Duration) -> GoogleSheetsClient {
        GoogleSheetsClient::with_base_url(
            http_client(timeout).unwrap(),
            format!("{}/v4/spreadsheets", base),
        )
    }

    #[test]
    fn test_values_url_encodes_range_as_one_segment() {
        let client = GoogleSheetsClient::new(Client::new());
        let url = client.values_url("abc123", "Alumnos!A2:E").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Alumnos!A2:E"
        );

        let url = client.values_url("abc123", "My Sheet!A1:B2").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/My%20Sheet!A1:B2"
        );
    }

    #[test]
    fn test_values_url_tolerates_trailing_slash() {
        let client = GoogleSheetsClient::with_base_url(Client::new(), "http://localhost:8080/v4/spreadsheets/");
        let url = client.values_url("id", "A1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v4/spreadsheets/id/values/A1");
    }

    #[test]
    fn test_parse_value_range() {
        let data = parse_value_range(
            r#"{
                "range": "Alumnos!A2:E1000",
                "majorDimension": "ROWS",
                "values": [["Ann", "101", "A", "ann@x.com"], ["Bo", "102"]]
            }"#,
        )
        .unwrap();

        assert_eq!(data.range, "Alumnos!A2:E1000");
        assert_eq!(data.major_dimension, MajorDimension::Rows);
        assert_eq!(data.values.len(), 2);
        assert_eq!(data.values[1], vec!["Bo".to_string(), "102".to_string()]);
    }

    #[test]
    fn test_missing_values_is_malformed() {
        let err = parse_value_range(r#"{"range": "Alumnos!A2:E", "majorDimension": "ROWS"}"#)
            .unwrap_err();
        assert!(matches!(err, SheetsError::MalformedResponse(ref key) if key == "values"));
    }

    #[test]
    fn test_missing_major_dimension_is_malformed() {
        let err = parse_value_range(r#"{"range": "Alumnos!A2:E", "values": []}"#).unwrap_err();
        assert!(matches!(err, SheetsError::MalformedResponse(ref key) if key == "majorDimension"));
    }

    #[test]
    fn test_garbage_body_is_a_decode_error() {
        let err = parse_value_range("upstream connect error").unwrap_err();
        assert!(matches!(err, SheetsError::Decode(_)));
    }

    #[tokio::test]
    async fn test_get_values_sends_bearer_token() {
        let (base, request) = serve_once(
            200,
            r#"{"range": "Alumnos!A2:E1000", "majorDimension": "ROWS", "values": [["Ann", "101", "A", "ann@x.com"]]}"#,
            Duration::ZERO,
        )
        .await;

        let data = client(&base, Duration::from_secs(5))
            .get_values("ya29.test", "sheet-id", "Alumnos!A2:E")
            .await
            .unwrap();
        assert_eq!(data.range, "Alumnos!A2:E1000");
        assert_eq!(data.values[0][1], "101");

        let request = request.await.unwrap();
        assert!(request.starts_with("GET /v4/spreadsheets/sheet-id/values/Alumnos!A2:E HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer ya29.test"));
    }

    #[tokio::test]
    async fn test_get_values_error_status_is_remote_api() {
        let (base, _request) = serve_once(
            403,
            r#"{"error": {"code": 403, "status": "PERMISSION_DENIED"}}"#,
            Duration::ZERO,
        )
        .await;

        let err = client(&base, Duration::from_secs(5))
            .get_values("ya29.test", "sheet-id", "Alumnos!A2:E")
            .await
            .unwrap_err();
        match err {
            SheetsError::RemoteApi { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("PERMISSION_DENIED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_values_puts_user_entered_json() {
        let (base, request) = serve_once(
            200,
            r#"{"spreadsheetId": "sheet-id", "updatedRange": "Alumnos!D3", "updatedCells": 1}"#,
            Duration::ZERO,
        )
        .await;

        let body = ValueRange {
            range: "Alumnos!D3:D3".to_string(),
            major_dimension: MajorDimension::Rows,
            values: vec![vec!["bo@new.com".to_string()]],
        };
        client(&base, Duration::from_secs(5))
            .update_values("ya29.test", "sheet-id", &body)
            .await
            .unwrap();

        let request = request.await.unwrap();
        assert!(request.starts_with(
            "PUT /v4/spreadsheets/sheet-id/values/Alumnos!D3:D3?valueInputOption=USER_ENTERED HTTP/1.1"
        ));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(
            r#"{"range":"Alumnos!D3:D3","majorDimension":"ROWS","values":[["bo@new.com"]]}"#
        ));
    }

    #[tokio::test]
    async fn test_update_values_error_status_is_remote_api() {
        let (base, _request) = serve_once(500, r#"{"error": "backend"}"#, Duration::ZERO).await;

        let body = ValueRange {
            range: "Alumnos!D3:D3".to_string(),
            major_dimension: MajorDimension::Rows,
            values: vec![vec!["bo@new.com".to_string()]],
        };
        let err = client(&base, Duration::from_secs(5))
            .update_values("ya29.test", "sheet-id", &body)
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsError::RemoteApi { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_slow_sheets_api_times_out() {
        let (base, _request) = serve_once(200, "{}", Duration::from_secs(5)).await;

        let err = client(&base, Duration::from_millis(100))
            .get_values("ya29.test", "sheet-id", "Alumnos!A2:E")
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsError::Timeout));
    }
}
