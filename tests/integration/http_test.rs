//! Query service client tests against a local HTTP listener.
//!
//! Each listener answers POST requests with one canned response and GET
//! requests with a one-entry query history.

use std::sync::Arc;

use db_workbench::backend::{
    Connection, ExecuteRequest, HttpBackend, QueryBackend, StatusCode, READ_ONLY_ERROR,
};
use db_workbench::config::BackendConfig;
use db_workbench::editor::{
    ExecuteConfig, ExecutionOutcome, SqlEditorStore, SqlExecutor, Tab, TabId, TabStore,
};
use db_workbench::error::WorkbenchError;
use db_workbench::notify::MemoryNotifier;
use db_workbench::permission::{Database, DatabaseStore, User, WorkspaceRole};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const HISTORY_BODY: &str = r#"{"queryHistories":[{"statement":"SELECT 1","database":"employee"}]}"#;

const READ_ONLY_BODY: &str = r#"{"code":3,"message":"Support SELECT sql statement only","details":[]}"#;

const SELECT_BODY: &str = r#"{
  "results": [{
    "columnNames": ["id"],
    "columnTypeNames": ["INT"],
    "rows": [[1], [2]],
    "statement": "SELECT id FROM users",
    "latencyMs": 3
  }],
  "allowExport": true
}"#;

/// Reads one request, headers and body, so the client never sees a reset.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Starts a listener and returns its base URL.
async fn serve(status_line: &'static str, query_body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let (status_line, body) = if request.starts_with("GET") {
                    ("200 OK", HISTORY_BODY)
                } else {
                    (status_line, query_body)
                };
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/")
}

fn client(url: String) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        url,
        token: Some("secret".to_string()),
    })
    .unwrap()
}

fn request(statement: &str) -> ExecuteRequest {
    ExecuteRequest {
        statement: statement.to_string(),
        connection: Connection::new("instances/prod", "101"),
        limit: 1000,
    }
}

struct Workbench {
    tabs: Arc<TabStore>,
    editor: Arc<SqlEditorStore>,
    executor: SqlExecutor,
    tab_id: TabId,
}

fn setup(backend: HttpBackend, workspace_role: WorkspaceRole) -> Workbench {
    let backend = Arc::new(backend);
    let tabs = Arc::new(TabStore::new());
    let tab_id = tabs.add_tab(
        Tab::new("employee").with_connection(Connection::new("instances/prod", "101")),
    );
    let editor = Arc::new(SqlEditorStore::new(backend.clone()));
    let databases = Arc::new(DatabaseStore::new());
    databases.upsert(Database {
        uid: "101".to_string(),
        ..Default::default()
    });

    let executor = SqlExecutor::new(
        backend,
        tabs.clone(),
        editor.clone(),
        Arc::new(MemoryNotifier::new()),
    )
    .with_databases(databases)
    .with_user(User {
        email: "dba@example.com".to_string(),
        name: "DBA".to_string(),
        workspace_role,
    });

    Workbench {
        tabs,
        editor,
        executor,
        tab_id,
    }
}

#[tokio::test]
async fn test_gateway_rejection_is_a_result_set() {
    let url = serve("400 Bad Request", READ_ONLY_BODY).await;

    let result = client(url)
        .execute_query(&request("DELETE FROM users WHERE id = 1"))
        .await
        .unwrap();

    assert_eq!(result.error, READ_ONLY_ERROR);
    assert_eq!(result.status, StatusCode::InvalidArgument);
    assert!(result.results.is_empty());
    assert!(!result.allow_export);
}

#[tokio::test]
async fn test_unstructured_error_body_is_a_transport_error() {
    let url = serve("502 Bad Gateway", "<html>upstream down</html>").await;

    let err = client(url)
        .execute_query(&request("SELECT 1"))
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Transport Error");
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_history_error_stays_an_error() {
    let url = serve("200 OK", SELECT_BODY).await;
    let backend = client(url);

    let history = backend.list_query_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].database, "employee");

    let unreachable = client("http://127.0.0.1:1/".to_string());
    let err = unreachable.list_query_history().await.unwrap_err();
    assert!(matches!(err, WorkbenchError::Transport(_)));
}

#[tokio::test]
async fn test_read_only_rejection_over_http_shows_hint() {
    let url = serve("400 Bad Request", READ_ONLY_BODY).await;
    let wb = setup(client(url), WorkspaceRole::Dba);

    let outcome = wb
        .executor
        .execute("DELETE FROM users WHERE id = 1", &ExecuteConfig::new("MYSQL"), None)
        .await;

    assert_eq!(outcome, ExecutionOutcome::ExecutingHint);
    assert!(wb.editor.is_show_executing_hint());
    let tab = wb.tabs.tab(&wb.tab_id).unwrap();
    assert!(tab.sql_result_set.is_none());
    assert!(!tab.is_executing_sql);
}

#[tokio::test]
async fn test_read_only_rejection_over_http_without_permission_fails() {
    let url = serve("400 Bad Request", READ_ONLY_BODY).await;
    let wb = setup(client(url), WorkspaceRole::Developer);

    let outcome = wb
        .executor
        .execute("DELETE FROM users WHERE id = 1", &ExecuteConfig::new("MYSQL"), None)
        .await;

    assert_eq!(outcome, ExecutionOutcome::Failed);
    assert!(!wb.editor.is_show_executing_hint());
    let result = wb.tabs.tab(&wb.tab_id).unwrap().sql_result_set.unwrap();
    assert_eq!(result.error, READ_ONLY_ERROR);
    assert_eq!(result.status, StatusCode::InvalidArgument);
}

#[tokio::test]
async fn test_select_over_http_publishes_rows_and_history() {
    let url = serve("200 OK", SELECT_BODY).await;
    let wb = setup(client(url), WorkspaceRole::Developer);

    let outcome = wb
        .executor
        .execute("SELECT id FROM users", &ExecuteConfig::new("MYSQL"), None)
        .await;
    wb.executor.wait_for_background().await;

    assert_eq!(outcome, ExecutionOutcome::Succeeded);
    let result = wb.tabs.tab(&wb.tab_id).unwrap().sql_result_set.unwrap();
    assert_eq!(result.status, StatusCode::Ok);
    assert_eq!(result.results[0].rows.len(), 2);
    assert_eq!(wb.editor.query_history_list().len(), 1);
}
