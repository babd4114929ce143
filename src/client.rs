use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::domain::RTError;

/// A single record as delivered by the data service.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDataRequest {
    pub config_name: String,
    pub parent_id: String,
    pub status_filter: String,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub label: String,
    pub field_name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDataResponse {
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub records: Vec<Row>,
    #[serde(default)]
    pub options: Vec<OptionDescriptor>,
    #[serde(default)]
    pub total_records: u64,
}

/// Structured error payload some services attach to failed responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("data request failed with status {status}")]
    Remote {
        status: u16,
        body: Option<ErrorBody>,
    },
    #[error("data request could not be completed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed table data: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Text shown to the user: the service supplied message when there is
    /// one, the generic description otherwise.
    pub fn user_message(&self) -> String {
        if let FetchError::Remote {
            body: Some(ErrorBody {
                message: Some(message),
            }),
            ..
        } = self
        {
            return message.clone();
        }
        self.to_string()
    }
}

/// Result of one dispatched request, tagged with the token it was issued with.
#[derive(Debug)]
pub struct FetchOutcome {
    pub token: u64,
    pub result: Result<TableDataResponse, FetchError>,
}

#[async_trait]
pub trait TableDataClient: Send + Sync {
    async fn get_table_data(
        &self,
        request: TableDataRequest,
    ) -> Result<TableDataResponse, FetchError>;
}

pub struct HttpTableDataClient {
    http: Client,
    endpoint: Url,
}

impl HttpTableDataClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RTError> {
        let endpoint = Url::parse(endpoint)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl TableDataClient for HttpTableDataClient {
    async fn get_table_data(
        &self,
        request: TableDataRequest,
    ) -> Result<TableDataResponse, FetchError> {
        debug!(endpoint = %self.endpoint, ?request, "requesting table data");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let body = serde_json::from_slice::<ErrorBody>(&bytes).ok();
            return Err(FetchError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/table")
    }

    fn request() -> TableDataRequest {
        TableDataRequest {
            config_name: "Subscriptions".into(),
            parent_id: "006A".into(),
            status_filter: "Active".into(),
            page: 2,
            per_page: 10,
        }
    }

    #[test]
    fn request_uses_camel_case_keys() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(
            value,
            json!({
                "configName": "Subscriptions",
                "parentId": "006A",
                "statusFilter": "Active",
                "page": 2,
                "perPage": 10
            })
        );
    }

    #[test]
    fn response_tolerates_missing_lists() {
        let response: TableDataResponse = serde_json::from_value(json!({
            "columns": [{ "label": "Name", "fieldName": "Name", "type": "text" }],
            "totalRecords": 4
        }))
        .unwrap();
        assert_eq!(response.columns[0].field_name, "Name");
        assert_eq!(response.columns[0].column_type.as_deref(), Some("text"));
        assert!(response.records.is_empty());
        assert!(response.options.is_empty());
        assert_eq!(response.total_records, 4);
    }

    #[test]
    fn user_message_prefers_body_message() {
        let err = FetchError::Remote {
            status: 500,
            body: Some(ErrorBody {
                message: Some("List has no rows for assignment".into()),
            }),
        };
        assert_eq!(err.user_message(), "List has no rows for assignment");
    }

    #[test]
    fn user_message_falls_back_to_generic_message() {
        let err = FetchError::Remote {
            status: 502,
            body: None,
        };
        assert_eq!(err.user_message(), "data request failed with status 502");

        let err = FetchError::Remote {
            status: 500,
            body: Some(ErrorBody::default()),
        };
        assert_eq!(err.user_message(), "data request failed with status 500");
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let result = HttpTableDataClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(RTError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn posts_request_and_decodes_response() {
        let app = Router::new().route(
            "/table",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["configName"], "Subscriptions");
                assert_eq!(body["page"], 2);
                Json(json!({
                    "columns": [{ "label": "Name", "fieldName": "Name" }],
                    "records": [{ "Id": "a01", "Name": "Gold" }],
                    "options": [{ "label": "Active", "value": "Active" }],
                    "totalRecords": 11
                }))
            }),
        );
        let endpoint = serve(app).await;
        let client = HttpTableDataClient::new(&endpoint, Duration::from_secs(5)).unwrap();

        let response = client.get_table_data(request()).await.unwrap();
        assert_eq!(response.total_records, 11);
        assert_eq!(response.records.len(), 1);
        assert_eq!(response.records[0]["Name"], "Gold");
        assert_eq!(response.options[0].value, "Active");
    }

    #[tokio::test]
    async fn surfaces_service_error_message() {
        let app = Router::new().route(
            "/table",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": "Unknown table configuration" })),
                )
            }),
        );
        let endpoint = serve(app).await;
        let client = HttpTableDataClient::new(&endpoint, Duration::from_secs(5)).unwrap();

        let err = client.get_table_data(request()).await.unwrap_err();
        assert!(matches!(err, FetchError::Remote { status: 400, .. }));
        assert_eq!(err.user_message(), "Unknown table configuration");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let app = Router::new().route("/table", post(|| async { "not json" }));
        let endpoint = serve(app).await;
        let client = HttpTableDataClient::new(&endpoint, Duration::from_secs(5)).unwrap();

        let err = client.get_table_data(request()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
