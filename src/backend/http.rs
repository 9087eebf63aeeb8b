//! HTTP client for the query execution service.
//!
//! Talks to the service's JSON gateway. The gateway answers a rejected
//! statement with a non-2xx status and a `{code, message}` body; query calls
//! fold that body into a failed [`ResultSet`] so it reaches the editor like
//! any other service answer.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{
    fold_service_error, ExecuteRequest, QueryBackend, QueryHistory, ResultSet, StatusCode,
};
use crate::config::BackendConfig;
use crate::error::{Result, WorkbenchError};

const QUERY_PATH: &str = "v1/sql/query";
const QUERY_HISTORY_PATH: &str = "v1/sql/queryHistories";

/// Query execution service client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: Url,
    token: Option<String>,
    client: Client,
}

impl HttpBackend {
    /// Creates a new client for the configured service.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base = config.base_url()?;
        let client = Client::builder().build().map_err(|e| {
            WorkbenchError::transport(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            base,
            token: config.token.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| WorkbenchError::config(format!("Invalid endpoint {path}: {e}")))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and returns the HTTP status with the raw body.
    async fn fetch(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<(reqwest::StatusCode, String)> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| WorkbenchError::transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WorkbenchError::transport(format!("Failed to read response: {}", e)))?;
        Ok((status, body))
    }

    /// Sends a request and decodes a JSON body, mapping non-2xx responses.
    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T> {
        let (status, body) = self.fetch(builder).await?;
        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }
        decode(&body)
    }

    /// Parses an error response body into a backend error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> WorkbenchError {
        if let Ok(error) = serde_json::from_str::<GatewayError>(body) {
            let code = error
                .code
                .and_then(StatusCode::from_code)
                .unwrap_or_else(|| status_from_http(status));
            return WorkbenchError::backend(code, error.message);
        }

        WorkbenchError::transport(format!("HTTP {}: {}", status, body))
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| WorkbenchError::transport(format!("Failed to parse response: {}", e)))
}

/// Maps an HTTP status onto the closest RPC status.
fn status_from_http(status: reqwest::StatusCode) -> StatusCode {
    match status.as_u16() {
        400 => StatusCode::InvalidArgument,
        401 => StatusCode::Unauthenticated,
        403 => StatusCode::PermissionDenied,
        404 => StatusCode::NotFound,
        409 => StatusCode::Aborted,
        429 => StatusCode::ResourceExhausted,
        499 => StatusCode::Cancelled,
        501 => StatusCode::Unimplemented,
        503 => StatusCode::Unavailable,
        504 => StatusCode::DeadlineExceeded,
        500..=599 => StatusCode::Internal,
        _ => StatusCode::Unknown,
    }
}

#[derive(Debug, Deserialize)]
struct GatewayError {
    code: Option<i32>,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryHistoryResponse {
    query_histories: Vec<QueryHistory>,
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn execute_query(&self, request: &ExecuteRequest) -> Result<ResultSet> {
        let url = self.endpoint(QUERY_PATH)?;
        debug!("POST {} ({} bytes of SQL)", url, request.statement.len());
        let (status, body) = self.fetch(self.client.post(url).json(request)).await?;
        if status.is_success() {
            return decode(&body);
        }

        debug!("Query rejected with HTTP {}", status);
        fold_service_error(Self::parse_error(status, &body))
    }

    async fn list_query_history(&self) -> Result<Vec<QueryHistory>> {
        let url = self.endpoint(QUERY_HISTORY_PATH)?;
        debug!("GET {}", url);
        let response: QueryHistoryResponse = self.send(self.client.get(url)).await?;
        Ok(response.query_histories)
    }
}
