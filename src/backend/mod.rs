//! Query execution service abstraction.
//!
//! Provides a trait-based interface to the remote service that runs SQL and
//! reviews it, allowing different transports to be used interchangeably.
//!
//! Every transport reports a statement the service refused the same way: as
//! `Ok` with a [`ResultSet`] carrying `error` and `status`. `Err` is left for
//! requests that never produced a service answer.

mod http;
mod mock;
mod types;

pub use http::HttpBackend;
pub use mock::{FailingBackend, MockBackend};
pub use types::{
    Advice, AdviceStatus, Connection, ExecuteRequest, QueryHistory, QueryResult, ResultSet, Row,
    StatusCode, Value,
};

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::error::{Result, WorkbenchError};
use async_trait::async_trait;

/// Error text the service returns when a non-read-only statement is sent to
/// the SQL editor endpoint.
pub const READ_ONLY_ERROR: &str = "Support SELECT sql statement only";

/// Returns true if the response is the service's read-only rejection.
///
/// Kept in one place: the match is on service wording, so a structured
/// error code can replace it here without touching callers.
pub fn is_read_only_violation(result: &ResultSet) -> bool {
    result.error == READ_ONLY_ERROR && result.status == StatusCode::InvalidArgument
}

/// Folds a service rejection into a failed result set. Other errors pass
/// through unchanged.
pub(crate) fn fold_service_error(error: WorkbenchError) -> Result<ResultSet> {
    match error {
        WorkbenchError::Backend { status, message } => Ok(ResultSet::error(status, message)),
        other => Err(other),
    }
}

/// Creates a backend client for the given configuration.
pub fn connect(config: &BackendConfig) -> Result<Arc<dyn QueryBackend>> {
    let client = HttpBackend::new(config)?;
    Ok(Arc::new(client))
}

/// Trait defining the interface to the query execution service.
///
/// Calls may suspend for as long as the service takes; no timeout is applied
/// at this layer.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Runs a statement and returns its result set with review advices.
    ///
    /// A statement the service rejects is still `Ok`, with the rejection in
    /// `ResultSet::error` and `ResultSet::status`.
    async fn execute_query(&self, request: &ExecuteRequest) -> Result<ResultSet>;

    /// Lists the current user's query history, newest first.
    async fn list_query_history(&self) -> Result<Vec<QueryHistory>>;
}
