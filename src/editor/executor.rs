//! Query execution for editor tabs.
//!
//! `SqlExecutor` runs the full flow for one tab: preflight, syntax gate,
//! dispatch, SQL review notification, and result publication. Every path
//! that opens a tab's in-flight gate closes it exactly once through
//! [`ExecutionGuard`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::advice::review_message;
use super::state::SqlEditorStore;
use super::tab::{ExecuteConfig, ExecuteOption, ExecuteParams, TabId, TabPatch, TabStore};
use crate::backend::{
    is_read_only_violation, Connection, ExecuteRequest, QueryBackend, ResultSet,
};
use crate::notify::{Notification, NotificationStyle, Notifier};
use crate::permission::{DatabaseStore, PermissionChecker, RolePermissionChecker, User};
use crate::sql::SqlValidator;

/// Default maximum number of rows requested per query.
pub const DEFAULT_RESULT_ROWS_LIMIT: u32 = 1000;

const TITLE_TIPS: &str = "Tips";
const MSG_QUERY_IN_PROGRESS: &str = "Cannot execute a query while another one is still running";
const MSG_SELECT_CONNECTION: &str = "Please select a connection first";
const MSG_EMPTY_STATEMENT: &str = "Please enter a SQL statement";
const MSG_INVALID_STATEMENT: &str = "Invalid SQL statement";
const TITLE_SQL_REVIEW: &str = "SQL review result";

/// Why a query was refused before anything was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The tab already has a query in flight.
    Busy,
    /// The tab has no connection.
    Disconnected,
    /// The statement is empty or whitespace.
    EmptyStatement,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "busy"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::EmptyStatement => write!(f, "empty statement"),
        }
    }
}

/// How an execution ended. The tab state is the durable record; this is
/// for logging and callers that want to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Rejected(RejectReason),
    InvalidSyntax,
    /// Read-only rejection downgraded to the "run as change" hint.
    ExecutingHint,
    Failed,
    Succeeded,
}

/// Holds a tab's in-flight gate open. Dropping it closes the gate.
#[must_use = "dropping the guard immediately ends the execution"]
#[derive(Debug)]
pub struct ExecutionGuard {
    tabs: Arc<TabStore>,
    tab_id: TabId,
    connection: Connection,
}

impl ExecutionGuard {
    pub fn tab_id(&self) -> &TabId {
        &self.tab_id
    }

    /// Connection of the tab at the time the gate opened.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        self.tabs.finish_execution(&self.tab_id);
    }
}

/// Runs queries for editor tabs.
pub struct SqlExecutor {
    backend: Arc<dyn QueryBackend>,
    tabs: Arc<TabStore>,
    editor: Arc<SqlEditorStore>,
    notifier: Arc<dyn Notifier>,
    databases: Arc<DatabaseStore>,
    permission: Arc<dyn PermissionChecker>,
    current_user: User,
    result_rows_limit: u32,
    background: TaskTracker,
}

impl SqlExecutor {
    /// Creates an executor with an empty database store, role-based
    /// permissions, and an anonymous user.
    pub fn new(
        backend: Arc<dyn QueryBackend>,
        tabs: Arc<TabStore>,
        editor: Arc<SqlEditorStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            tabs,
            editor,
            notifier,
            databases: Arc::new(DatabaseStore::new()),
            permission: Arc::new(RolePermissionChecker),
            current_user: User::default(),
            result_rows_limit: DEFAULT_RESULT_ROWS_LIMIT,
            background: TaskTracker::new(),
        }
    }

    pub fn with_databases(mut self, databases: Arc<DatabaseStore>) -> Self {
        self.databases = databases;
        self
    }

    pub fn with_permission(mut self, permission: Arc<dyn PermissionChecker>) -> Self {
        self.permission = permission;
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.current_user = user;
        self
    }

    pub fn with_result_rows_limit(mut self, limit: u32) -> Self {
        self.result_rows_limit = limit;
        self
    }

    /// Checks that the current tab can run `query` and opens its gate.
    ///
    /// On rejection the user is notified and no tab state changes.
    pub fn preflight(&self, query: &str) -> Result<ExecutionGuard, RejectReason> {
        let tab = self.tabs.current_tab();

        let checked = match tab {
            Some(tab) if tab.is_executing_sql => Err(RejectReason::Busy),
            Some(tab) => match (tab.id, tab.connection) {
                (Some(id), Some(connection)) if !query.trim().is_empty() => Ok((id, connection)),
                (Some(_), Some(_)) => Err(RejectReason::EmptyStatement),
                _ => Err(RejectReason::Disconnected),
            },
            None => Err(RejectReason::Disconnected),
        };

        let (tab_id, connection) = match checked {
            Ok(found) => found,
            Err(reason) => {
                self.notify_rejection(reason);
                return Err(reason);
            }
        };

        // Another caller may have opened the gate since the snapshot.
        if !self.tabs.try_begin_execution(&tab_id) {
            self.notify_rejection(RejectReason::Busy);
            return Err(RejectReason::Busy);
        }

        Ok(ExecutionGuard {
            tabs: Arc::clone(&self.tabs),
            tab_id,
            connection,
        })
    }

    /// Runs `query` on the current tab and publishes the outcome to it.
    ///
    /// Never fails: every error ends up as a notification or a failure
    /// result on the tab.
    pub async fn execute(
        &self,
        query: &str,
        config: &ExecuteConfig,
        option: Option<ExecuteOption>,
    ) -> ExecutionOutcome {
        let guard = match self.preflight(query) {
            Ok(guard) => guard,
            Err(reason) => {
                debug!("Query rejected: {}", reason);
                return ExecutionOutcome::Rejected(reason);
            }
        };

        if let Some(error) = SqlValidator::for_database_type(&config.database_type)
            .parse_sql(query)
            .error
        {
            debug!("Query failed to parse: {}", error);
            self.notify(Notification::new(
                NotificationStyle::Critical,
                MSG_INVALID_STATEMENT,
            ));
            return ExecutionOutcome::InvalidSyntax;
        }

        let statement = if option.is_some_and(|o| o.explain) {
            format!("EXPLAIN {query}")
        } else {
            query.to_string()
        };

        let request = ExecuteRequest {
            statement,
            connection: guard.connection().clone(),
            limit: self.result_rows_limit,
        };
        let params = ExecuteParams {
            query: query.to_string(),
            config: config.clone(),
            option,
        };

        info!(tab = %guard.tab_id(), database = %request.connection.database_id, "Executing query");
        let start = Instant::now();
        let response = self.backend.execute_query(&request).await;
        debug!("Query returned after {:?}", start.elapsed());

        match response {
            Ok(result_set) => self.handle_response(&guard, result_set, params),
            Err(e) => {
                warn!("Query dispatch failed: {}", e);
                let failure = ResultSet::failure(e.user_message(), Vec::new(), e.status());
                self.publish(guard.tab_id(), failure, params);
                ExecutionOutcome::Failed
            }
        }
    }

    /// Waits for background history refreshes spawned so far.
    pub async fn wait_for_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    fn handle_response(
        &self,
        guard: &ExecutionGuard,
        result_set: ResultSet,
        params: ExecuteParams,
    ) -> ExecutionOutcome {
        if let Some((style, message)) = review_message(&result_set.advices) {
            self.notify(Notification::new(style, TITLE_SQL_REVIEW).with_description(message));
        }

        if result_set.has_error() {
            if is_read_only_violation(&result_set)
                && self.can_alter(&guard.connection().database_id)
            {
                info!(tab = %guard.tab_id(), "Read-only rejection, offering change editor");
                self.editor.set_executing_hint(true);
                return ExecutionOutcome::ExecutingHint;
            }

            let failure = ResultSet::failure(
                result_set.error,
                result_set.advices,
                result_set.status,
            );
            self.publish(guard.tab_id(), failure, params);
            return ExecutionOutcome::Failed;
        }

        self.publish(guard.tab_id(), result_set, params);
        self.spawn_history_refresh();
        ExecutionOutcome::Succeeded
    }

    fn can_alter(&self, database_uid: &str) -> bool {
        match self.databases.get_by_uid(database_uid) {
            Some(database) => self.permission.is_alterable(&database, &self.current_user),
            None => {
                debug!("Database {} unknown, treating as not alterable", database_uid);
                false
            }
        }
    }

    fn publish(&self, tab_id: &TabId, result_set: ResultSet, params: ExecuteParams) {
        let patch = TabPatch {
            sql_result_set: Some(Arc::new(result_set)),
            execute_params: Some(params),
            ..Default::default()
        };
        if let Err(e) = self.tabs.update_tab(tab_id, patch) {
            warn!("Dropping result for tab {}: {}", tab_id, e);
        }
    }

    fn spawn_history_refresh(&self) {
        let editor = Arc::clone(&self.editor);
        self.background.spawn(async move {
            if let Err(e) = editor.fetch_query_history_list().await {
                warn!("Failed to refresh query history: {}", e);
            }
        });
    }

    fn notify_rejection(&self, reason: RejectReason) {
        let notification = match reason {
            RejectReason::Busy => Notification::new(NotificationStyle::Info, TITLE_TIPS)
                .with_description(MSG_QUERY_IN_PROGRESS),
            RejectReason::Disconnected => {
                Notification::new(NotificationStyle::Critical, MSG_SELECT_CONNECTION)
            }
            RejectReason::EmptyStatement => {
                Notification::new(NotificationStyle::Critical, MSG_EMPTY_STATEMENT)
            }
        };
        self.notify(notification);
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}

impl fmt::Debug for SqlExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlExecutor")
            .field("tabs", &self.tabs)
            .field("current_user", &self.current_user)
            .field("result_rows_limit", &self.result_rows_limit)
            .finish_non_exhaustive()
    }
}
