//! Command-line argument parsing for the workbench.
//!
//! Uses clap to run one query through the editor executor.

use clap::Parser;
use db_workbench::config::{Config, ConnectionConfig};
use db_workbench::error::{Result, WorkbenchError};
use std::io::Read;
use std::path::PathBuf;

/// How the result set is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain-text table.
    #[default]
    Text,
    /// The published result set as JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Run read-only SQL through the SQL editor pipeline.
#[derive(Parser, Debug)]
#[command(name = "workbench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL to execute ("-" reads from stdin)
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Query service base URL (overrides config)
    #[arg(long, value_name = "URL", env = "WORKBENCH_URL")]
    pub backend_url: Option<String>,

    /// Database engine for syntax checking (overrides config)
    #[arg(long, value_name = "TYPE")]
    pub database_type: Option<String>,

    /// Run the statement under EXPLAIN
    #[arg(long)]
    pub explain: bool,

    /// Use the in-memory mock service (for testing)
    #[arg(long)]
    pub mock_backend: bool,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: OutputFormat,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the query text, reading stdin for "-".
    pub fn read_query(&self) -> Result<String> {
        if self.query != "-" {
            return Ok(self.query.clone());
        }

        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| WorkbenchError::internal(format!("Failed to read stdin: {e}")))?;
        Ok(buf)
    }

    /// Applies CLI overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.backend_url {
            config.backend.url = url.clone();
        }
        if let Some(database_type) = &self.database_type {
            config.editor.database_type = database_type.clone();
        }
    }

    /// Resolves the connection to bind the tab to.
    pub fn resolve_connection<'a>(&self, config: &'a Config) -> Result<&'a ConnectionConfig> {
        match self.connection.as_deref() {
            Some(name) => config.get_connection(Some(name)).ok_or_else(|| {
                WorkbenchError::config(format!("Connection '{}' not found in config file", name))
            }),
            None => config.get_connection(None).ok_or_else(|| {
                WorkbenchError::config("No default connection configured. Use --connection")
            }),
        }
    }
}
