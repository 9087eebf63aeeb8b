//! Configuration management for the workbench.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named connections and the signed-in user.

use crate::backend::Connection;
use crate::editor::DEFAULT_RESULT_ROWS_LIMIT;
use crate::error::{Result, WorkbenchError};
use crate::permission::{Database, Project, ProjectMember, ProjectRole, User};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Query execution service.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Editor behaviour.
    #[serde(default)]
    pub editor: EditorConfig,

    /// The signed-in user, used for permission checks.
    #[serde(default)]
    pub user: User,

    /// Named connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// Query execution service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the service, e.g. `https://bytebase.example.com/`.
    #[serde(default = "default_url")]
    pub url: String,

    /// Bearer token (not recommended to store in config).
    pub token: Option<String>,
}

fn default_url() -> String {
    "http://localhost:8080/".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
        }
    }
}

impl BackendConfig {
    /// Parses the base URL. The path always ends with `/` so endpoint paths
    /// join beneath it.
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| WorkbenchError::config(format!("Invalid backend URL: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(WorkbenchError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }

    /// Fills a missing token from `WORKBENCH_TOKEN`.
    pub fn apply_env_defaults(&mut self) {
        if self.token.is_none() {
            self.token = std::env::var("WORKBENCH_TOKEN").ok();
        }
    }
}

/// Editor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Maximum rows requested per query.
    #[serde(default = "default_result_rows_limit")]
    pub result_rows_limit: u32,

    /// Engine assumed when a connection does not name one.
    #[serde(default = "default_database_type")]
    pub database_type: String,
}

fn default_result_rows_limit() -> u32 {
    DEFAULT_RESULT_ROWS_LIMIT
}

fn default_database_type() -> String {
    "MYSQL".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            result_rows_limit: default_result_rows_limit(),
            database_type: default_database_type(),
        }
    }
}

/// A named connection: which database a new tab is bound to.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Instance resource name, e.g. `instances/prod-mysql`.
    pub instance: String,

    /// Database name.
    pub database: String,

    /// Database uid used by the service.
    pub database_uid: String,

    /// Engine name (`MYSQL`, `POSTGRES`, ...). Defaults to `editor.database_type`.
    pub database_type: Option<String>,

    /// Project the database belongs to.
    pub project: Option<String>,

    /// The user's role in that project.
    pub project_role: Option<ProjectRole>,
}

impl ConnectionConfig {
    pub fn to_connection(&self) -> Connection {
        Connection::new(&self.instance, &self.database_uid)
    }

    /// Builds the database record used for permission checks.
    pub fn to_database(&self, user: &User) -> Database {
        let members = self
            .project_role
            .map(|role| ProjectMember {
                email: user.email.clone(),
                role,
            })
            .into_iter()
            .collect();

        Database {
            uid: self.database_uid.clone(),
            name: self.database.clone(),
            instance: self.instance.clone(),
            project: Project {
                resource_id: self.project.clone().unwrap_or_default(),
                members,
            },
        }
    }

    /// Returns a display string for logs and prompts.
    pub fn display_string(&self) -> String {
        format!("{} @ {}", self.database, self.instance)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("db-workbench")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkbenchError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            WorkbenchError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.editor.result_rows_limit == 0 {
            return Err(WorkbenchError::config(
                "editor.result_rows_limit must be greater than 0",
            ));
        }
        self.backend.base_url()?;
        for (name, conn) in &self.connections {
            if conn.database_uid.is_empty() {
                return Err(WorkbenchError::config(format!(
                    "connections.{name}: database_uid is required"
                )));
            }
        }
        Ok(())
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}
