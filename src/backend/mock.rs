//! Mock query backends for testing.
//!
//! Provides an in-memory service implementation for headless runs and tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{
    fold_service_error, ExecuteRequest, QueryBackend, QueryHistory, QueryResult, ResultSet,
    StatusCode, Value, READ_ONLY_ERROR,
};
use crate::error::{Result, WorkbenchError};
use crate::sql;

/// Pauses dispatches until released, so tests can observe in-flight state.
#[derive(Debug, Default)]
struct Hold {
    entered: Notify,
    release: Notify,
}

/// A mock backend that returns scripted results.
///
/// Statements are matched case-insensitively against registered prefixes.
/// Unscripted statements follow the service's read-only rule: reads return
/// one row, anything else is rejected with [`READ_ONLY_ERROR`]. Scripted
/// backend errors are folded into failed result sets the way
/// [`super::HttpBackend`] folds gateway error bodies.
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: Vec<(String, Result<ResultSet>)>,
    history: Vec<QueryHistory>,
    history_error: Option<WorkbenchError>,
    hold: Option<Arc<Hold>>,
    requests: Mutex<Vec<ExecuteRequest>>,
    history_fetches: AtomicUsize,
}

impl MockBackend {
    /// Creates a new mock backend with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `result` for statements starting with `prefix`.
    pub fn with_response(mut self, prefix: impl Into<String>, result: ResultSet) -> Self {
        self.responses.push((prefix.into(), Ok(result)));
        self
    }

    /// Answers statements starting with `prefix` with `error`. A
    /// [`WorkbenchError::Backend`] becomes a failed result set; anything else
    /// fails the dispatch.
    pub fn with_error(mut self, prefix: impl Into<String>, error: WorkbenchError) -> Self {
        self.responses.push((prefix.into(), Err(error)));
        self
    }

    /// Sets the query history list returned to the editor.
    pub fn with_history(mut self, history: Vec<QueryHistory>) -> Self {
        self.history = history;
        self
    }

    /// Makes history listing fail with the given error.
    pub fn with_history_error(mut self, error: WorkbenchError) -> Self {
        self.history_error = Some(error);
        self
    }

    /// Holds every dispatch until [`MockBackend::release`] is called.
    pub fn with_hold(mut self) -> Self {
        self.hold = Some(Arc::new(Hold::default()));
        self
    }

    /// Waits until a held dispatch has reached the backend.
    pub async fn entered(&self) {
        if let Some(hold) = &self.hold {
            hold.entered.notified().await;
        }
    }

    /// Lets one held dispatch continue.
    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.release.notify_one();
        }
    }

    /// Returns every request dispatched so far.
    pub fn requests(&self) -> Vec<ExecuteRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Returns the number of dispatched requests.
    pub fn dispatch_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Returns how many times the history list was fetched.
    pub fn history_fetch_count(&self) -> usize {
        self.history_fetches.load(Ordering::SeqCst)
    }

    fn respond(&self, statement: &str) -> Result<ResultSet> {
        let upper = statement.trim_start().to_uppercase();
        for (prefix, result) in &self.responses {
            if upper.starts_with(&prefix.to_uppercase()) {
                return result.clone().or_else(fold_service_error);
            }
        }

        if sql::is_read_only(statement) {
            let row = vec![Value::String(format!("Mock result for: {}", statement))];
            let mut result = QueryResult::with_data(vec!["result".to_string()], vec![row]);
            result.column_type_names = vec!["TEXT".to_string()];
            result.statement = statement.to_string();
            Ok(ResultSet::success(vec![result]))
        } else {
            Ok(ResultSet::error(StatusCode::InvalidArgument, READ_ONLY_ERROR))
        }
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    async fn execute_query(&self, request: &ExecuteRequest) -> Result<ResultSet> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(hold) = &self.hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        self.respond(&request.statement)
    }

    async fn list_query_history(&self) -> Result<Vec<QueryHistory>> {
        self.history_fetches.fetch_add(1, Ordering::SeqCst);
        match &self.history_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.history.clone()),
        }
    }
}

/// A backend whose every call fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    error: WorkbenchError,
}

impl FailingBackend {
    /// Creates a backend failing with the given error.
    pub fn new(error: WorkbenchError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl QueryBackend for FailingBackend {
    async fn execute_query(&self, _request: &ExecuteRequest) -> Result<ResultSet> {
        Err(self.error.clone())
    }

    async fn list_query_history(&self) -> Result<Vec<QueryHistory>> {
        Err(self.error.clone())
    }
}
