//! End-to-end execution tests.
//!
//! Runs queries through `SqlExecutor` with the mock service and checks what
//! each tab ends up publishing.

use std::sync::Arc;

use db_workbench::backend::{
    Advice, AdviceStatus, Connection, MockBackend, QueryHistory, ResultSet, StatusCode,
    READ_ONLY_ERROR,
};
use db_workbench::editor::{
    ExecuteConfig, ExecuteOption, ExecutionOutcome, RejectReason, SqlEditorStore, SqlExecutor,
    Tab, TabId, TabStore,
};
use db_workbench::error::WorkbenchError;
use db_workbench::notify::{MemoryNotifier, NotificationStyle};
use db_workbench::permission::{
    Database, DatabaseStore, Project, ProjectMember, ProjectRole, User, WorkspaceRole,
};
use pretty_assertions::assert_eq;

struct Workbench {
    backend: Arc<MockBackend>,
    tabs: Arc<TabStore>,
    editor: Arc<SqlEditorStore>,
    notifier: Arc<MemoryNotifier>,
    executor: SqlExecutor,
    tab_id: TabId,
}

fn developer() -> User {
    User {
        email: "dev@example.com".to_string(),
        name: "Dev".to_string(),
        workspace_role: WorkspaceRole::Developer,
    }
}

fn employee_db(role: Option<ProjectRole>) -> Database {
    Database {
        uid: "101".to_string(),
        name: "employee".to_string(),
        instance: "instances/prod".to_string(),
        project: Project {
            resource_id: "hr".to_string(),
            members: role
                .map(|role| ProjectMember {
                    email: "dev@example.com".to_string(),
                    role,
                })
                .into_iter()
                .collect(),
        },
    }
}

fn setup(backend: MockBackend, project_role: Option<ProjectRole>) -> Workbench {
    let backend = Arc::new(backend);
    let tabs = Arc::new(TabStore::new());
    let tab_id = tabs.add_tab(
        Tab::new("employee").with_connection(Connection::new("instances/prod", "101")),
    );
    let editor = Arc::new(SqlEditorStore::new(backend.clone()));
    let notifier = Arc::new(MemoryNotifier::new());
    let databases = Arc::new(DatabaseStore::new());
    databases.upsert(employee_db(project_role));

    let executor = SqlExecutor::new(
        backend.clone(),
        tabs.clone(),
        editor.clone(),
        notifier.clone(),
    )
    .with_databases(databases)
    .with_user(developer())
    .with_result_rows_limit(200);

    Workbench {
        backend,
        tabs,
        editor,
        notifier,
        executor,
        tab_id,
    }
}

fn postgres() -> ExecuteConfig {
    ExecuteConfig::new("POSTGRES")
}

#[tokio::test]
async fn test_select_publishes_rows_and_refreshes_history() {
    let history = vec![QueryHistory {
        statement: "SELECT 1".to_string(),
        database: "employee".to_string(),
        ..Default::default()
    }];
    let wb = setup(MockBackend::new().with_history(history.clone()), None);

    let outcome = wb
        .executor
        .execute("SELECT 1", &postgres(), Some(ExecuteOption::default()))
        .await;
    wb.executor.wait_for_background().await;

    assert_eq!(outcome, ExecutionOutcome::Succeeded);
    let tab = wb.tabs.tab(&wb.tab_id).unwrap();
    let result = tab.sql_result_set.unwrap();
    assert!(!result.has_error());
    assert!(result.allow_export);
    assert_eq!(result.results[0].rows.len(), 1);
    assert!(!tab.is_executing_sql);
    assert_eq!(wb.editor.query_history_list(), history);

    let request = &wb.backend.requests()[0];
    assert_eq!(request.limit, 200);
    assert_eq!(request.connection, Connection::new("instances/prod", "101"));
}

#[tokio::test]
async fn test_empty_query_never_dispatched() {
    let wb = setup(MockBackend::new(), None);

    for query in ["", "   ", "\n\t"] {
        let outcome = wb.executor.execute(query, &postgres(), None).await;
        assert_eq!(outcome, ExecutionOutcome::Rejected(RejectReason::EmptyStatement));
    }

    assert_eq!(wb.backend.dispatch_count(), 0);
    assert!(!wb.tabs.tab(&wb.tab_id).unwrap().is_executing_sql);
    assert_eq!(wb.notifier.notifications().len(), 3);
}

#[tokio::test]
async fn test_success_only_advices_emit_no_notification() {
    let payload = ResultSet::success(vec![])
        .with_advices(vec![Advice::new(AdviceStatus::Success, "OK")]);
    let wb = setup(MockBackend::new().with_response("SELECT", payload), None);

    wb.executor.execute("SELECT 1", &postgres(), None).await;

    assert!(wb.notifier.is_empty());
}

#[tokio::test]
async fn test_warning_advice_notifies_and_still_publishes() {
    let payload = ResultSet::success(vec![]).with_advices(vec![Advice::new(
        AdviceStatus::Warning,
        "Avoid SELECT *",
    )
    .with_content("List the columns you need")]);
    let wb = setup(MockBackend::new().with_response("SELECT", payload.clone()), None);

    let outcome = wb.executor.execute("SELECT * FROM t", &postgres(), None).await;

    assert_eq!(outcome, ExecutionOutcome::Succeeded);
    let notifications = wb.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].style, NotificationStyle::Warn);
    assert_eq!(
        notifications[0].description.as_deref(),
        Some("WARNING: Avoid SELECT *\nList the columns you need\n")
    );
    assert_eq!(
        *wb.tabs.tab(&wb.tab_id).unwrap().sql_result_set.unwrap(),
        payload
    );
}

#[tokio::test]
async fn test_write_with_project_developer_shows_hint() {
    let wb = setup(MockBackend::new(), Some(ProjectRole::Developer));

    let outcome = wb
        .executor
        .execute("UPDATE employee SET salary = 0", &postgres(), None)
        .await;

    assert_eq!(outcome, ExecutionOutcome::ExecutingHint);
    assert!(wb.editor.is_show_executing_hint());
    let tab = wb.tabs.tab(&wb.tab_id).unwrap();
    assert!(tab.sql_result_set.is_none());
    assert!(tab.execute_params.is_none());
    assert!(!tab.is_executing_sql);
}

#[tokio::test]
async fn test_write_with_project_querier_fails() {
    let wb = setup(MockBackend::new(), Some(ProjectRole::Querier));

    let outcome = wb
        .executor
        .execute("UPDATE employee SET salary = 0", &postgres(), None)
        .await;
    wb.executor.wait_for_background().await;

    assert_eq!(outcome, ExecutionOutcome::Failed);
    assert!(!wb.editor.is_show_executing_hint());
    let tab = wb.tabs.tab(&wb.tab_id).unwrap();
    let result = tab.sql_result_set.unwrap();
    assert_eq!(result.error, READ_ONLY_ERROR);
    assert_eq!(result.status, StatusCode::InvalidArgument);
    assert!(result.results.is_empty());
    assert_eq!(tab.execute_params.unwrap().query, "UPDATE employee SET salary = 0");
    assert_eq!(wb.backend.history_fetch_count(), 0);
}

#[tokio::test]
async fn test_read_only_text_with_other_status_is_a_failure() {
    let payload = ResultSet::error(StatusCode::Internal, READ_ONLY_ERROR);
    let wb = setup(
        MockBackend::new().with_response("UPDATE", payload),
        Some(ProjectRole::Owner),
    );

    let outcome = wb
        .executor
        .execute("UPDATE employee SET salary = 0", &postgres(), None)
        .await;

    assert_eq!(outcome, ExecutionOutcome::Failed);
    assert!(!wb.editor.is_show_executing_hint());
}

#[tokio::test]
async fn test_transport_failure_publishes_failure_result() {
    let wb = setup(
        MockBackend::new().with_error("SELECT", WorkbenchError::transport("connection reset")),
        None,
    );

    let outcome = wb.executor.execute("SELECT 1", &postgres(), None).await;

    assert_eq!(outcome, ExecutionOutcome::Failed);
    let result = wb.tabs.tab(&wb.tab_id).unwrap().sql_result_set.unwrap();
    assert_eq!(result.error, "Transport error: connection reset");
    assert!(!result.allow_export);
}

#[tokio::test]
async fn test_explain_sends_prefixed_statement_but_records_query() {
    let wb = setup(MockBackend::new(), None);

    wb.executor
        .execute(
            "SELECT * FROM employee",
            &postgres(),
            Some(ExecuteOption { explain: true }),
        )
        .await;

    assert_eq!(
        wb.backend.requests()[0].statement,
        "EXPLAIN SELECT * FROM employee"
    );
    let params = wb.tabs.tab(&wb.tab_id).unwrap().execute_params.unwrap();
    assert_eq!(params.query, "SELECT * FROM employee");
    assert_eq!(params.option, Some(ExecuteOption { explain: true }));
}

#[tokio::test]
async fn test_syntax_error_keeps_previous_result() {
    let wb = setup(MockBackend::new(), None);

    wb.executor.execute("SELECT 1", &postgres(), None).await;
    let before = wb.tabs.tab(&wb.tab_id).unwrap().sql_result_set.unwrap();

    let outcome = wb
        .executor
        .execute("SELEC * FORM employee", &postgres(), None)
        .await;

    assert_eq!(outcome, ExecutionOutcome::InvalidSyntax);
    let after = wb.tabs.tab(&wb.tab_id).unwrap().sql_result_set.unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(wb.backend.dispatch_count(), 1);
}
