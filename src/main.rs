//! workbench - run SQL through the SQL editor execution pipeline.

mod cli;
mod output;

use std::sync::Arc;

use cli::{Cli, OutputFormat};
use db_workbench::backend::{self, MockBackend, QueryBackend};
use db_workbench::config::Config;
use db_workbench::editor::{
    ExecuteConfig, ExecuteOption, ExecutionOutcome, SqlEditorStore, SqlExecutor, Tab, TabStore,
};
use db_workbench::error::{Result, WorkbenchError};
use db_workbench::logging::{self, LogTarget};
use db_workbench::notify::ChannelNotifier;
use db_workbench::permission::DatabaseStore;
use tracing::{error, info};

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse_args();

    logging::init(LogTarget::from_flag(cli.log_file));

    if let Err(e) = run(cli) {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);
    config.backend.apply_env_defaults();

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| WorkbenchError::internal(format!("Failed to start runtime: {e}")))?;
    runtime.block_on(execute(cli, config))
}

async fn execute(cli: Cli, config: Config) -> Result<()> {
    let query = cli.read_query()?;
    let conn = cli.resolve_connection(&config)?;
    info!("Connection: {}", conn.display_string());

    let backend: Arc<dyn QueryBackend> = if cli.mock_backend {
        Arc::new(MockBackend::new())
    } else {
        backend::connect(&config.backend)?
    };

    let tabs = Arc::new(TabStore::new());
    let tab_id = tabs.add_tab(
        Tab::new(&conn.database)
            .with_connection(conn.to_connection())
            .with_statement(&query),
    );

    let databases = Arc::new(DatabaseStore::new());
    databases.upsert(conn.to_database(&config.user));

    let editor = Arc::new(SqlEditorStore::new(backend.clone()));
    let (notifier, mut notifications) = ChannelNotifier::new();
    let executor = SqlExecutor::new(backend, tabs.clone(), editor.clone(), Arc::new(notifier))
        .with_databases(databases)
        .with_user(config.user.clone())
        .with_result_rows_limit(config.editor.result_rows_limit);

    let database_type = conn
        .database_type
        .clone()
        .unwrap_or_else(|| config.editor.database_type.clone());
    let option = ExecuteOption {
        explain: cli.explain,
    };

    let outcome = executor
        .execute(&query, &ExecuteConfig::new(database_type), Some(option))
        .await;
    executor.wait_for_background().await;

    while let Ok(notification) = notifications.try_recv() {
        eprintln!("{notification}");
    }

    if let Some(result_set) = tabs.tab(&tab_id).and_then(|t| t.sql_result_set) {
        match cli.output {
            OutputFormat::Text => print!("{}", output::render_text(&result_set)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(result_set.as_ref()).map_err(|e| {
                    WorkbenchError::internal(format!("Failed to encode result: {e}"))
                })?;
                println!("{json}");
            }
        }
    }

    match outcome {
        ExecutionOutcome::Succeeded => Ok(()),
        ExecutionOutcome::ExecutingHint => Err(WorkbenchError::query(
            "The statement changes data. Submit it as a change request instead.",
        )),
        ExecutionOutcome::Rejected(reason) => {
            Err(WorkbenchError::query(format!("Query rejected: {reason}")))
        }
        ExecutionOutcome::InvalidSyntax => Err(WorkbenchError::query("Invalid SQL statement")),
        ExecutionOutcome::Failed => Err(WorkbenchError::query("Query failed")),
    }
}
