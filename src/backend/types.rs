//! Wire types exchanged with the query execution service.
//!
//! Field names follow the service's JSON encoding (camelCase, status codes
//! as integers).

use serde::{Deserialize, Serialize};
use std::fmt;

/// RPC status code attached to every result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum StatusCode {
    #[default]
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl StatusCode {
    const ALL: [StatusCode; 17] = [
        Self::Ok,
        Self::Cancelled,
        Self::Unknown,
        Self::InvalidArgument,
        Self::DeadlineExceeded,
        Self::NotFound,
        Self::AlreadyExists,
        Self::PermissionDenied,
        Self::ResourceExhausted,
        Self::FailedPrecondition,
        Self::Aborted,
        Self::OutOfRange,
        Self::Unimplemented,
        Self::Internal,
        Self::Unavailable,
        Self::DataLoss,
        Self::Unauthenticated,
    ];

    /// Returns the numeric code.
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Looks up a status by its numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    /// Returns the canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl TryFrom<i32> for StatusCode {
    type Error = String;

    fn try_from(code: i32) -> std::result::Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown status code: {code}"))
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a SQL review finding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdviceStatus {
    #[default]
    StatusUnspecified,
    Success,
    Warning,
    Error,
}

impl AdviceStatus {
    /// Returns the wire label (`SUCCESS`, `WARNING`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StatusUnspecified => "STATUS_UNSPECIFIED",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for AdviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lint finding attached to a query by SQL review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Advice {
    pub status: AdviceStatus,
    pub code: i32,
    pub title: String,
    pub content: String,
    pub line: i32,
}

impl Advice {
    /// Creates an advice with the given severity and title.
    pub fn new(status: AdviceStatus, title: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets the detail text.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// A single cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the value for plain-text output.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Result of one statement inside a result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryResult {
    pub column_names: Vec<String>,
    pub column_type_names: Vec<String>,
    pub rows: Vec<Row>,
    pub statement: String,
    pub latency_ms: u64,
    pub error: String,
}

impl QueryResult {
    /// Creates a query result with the given columns and rows.
    pub fn with_data(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            column_names,
            rows,
            ..Default::default()
        }
    }

    /// Returns true if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Full response to one query execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResultSet {
    /// Execution error; empty when the query succeeded.
    pub error: String,
    pub results: Vec<QueryResult>,
    pub advices: Vec<Advice>,
    pub status: StatusCode,
    pub allow_export: bool,
}

impl ResultSet {
    /// Creates a successful result set.
    pub fn success(results: Vec<QueryResult>) -> Self {
        Self {
            results,
            allow_export: true,
            ..Default::default()
        }
    }

    /// Creates a result set carrying an execution error.
    pub fn error(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status,
            ..Default::default()
        }
    }

    /// Attaches review advices.
    pub fn with_advices(mut self, advices: Vec<Advice>) -> Self {
        self.advices = advices;
        self
    }

    /// Returns true if the response carries an execution error.
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Shape published to a tab when execution failed: no rows, export off.
    pub fn failure(error: impl Into<String>, advices: Vec<Advice>, status: StatusCode) -> Self {
        Self {
            error: error.into(),
            results: Vec::new(),
            advices,
            status,
            allow_export: false,
        }
    }
}

/// Instance and database a tab is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub instance_id: String,
    pub database_id: String,
}

impl Connection {
    /// Creates a connection for the given instance and database.
    pub fn new(instance_id: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            database_id: database_id.into(),
        }
    }
}

/// Request sent to the query execution service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub statement: String,
    pub connection: Connection,
    pub limit: u32,
}

/// An entry of the user's query history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryHistory {
    pub name: String,
    pub creator: String,
    pub create_time: String,
    pub statement: String,
    pub database: String,
    pub duration_ms: u64,
}
