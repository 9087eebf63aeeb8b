//! Editor tabs and their execution state.
//!
//! `TabStore` is the single record of what each tab is running and what it
//! last produced. It is shared behind an `Arc` and never locked across an
//! `.await`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::backend::{Connection, ResultSet};
use crate::error::{Result, WorkbenchError};

/// Identifier of an editor tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-call settings chosen by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteConfig {
    /// Database engine name, used to pick the SQL dialect.
    pub database_type: String,
}

impl ExecuteConfig {
    pub fn new(database_type: impl Into<String>) -> Self {
        Self {
            database_type: database_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOption {
    /// Run the statement under `EXPLAIN`.
    pub explain: bool,
}

/// The last executed query with its settings, kept for re-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteParams {
    pub query: String,
    pub config: ExecuteConfig,
    pub option: Option<ExecuteOption>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tab {
    pub id: Option<TabId>,
    pub name: String,
    pub statement: String,
    pub connection: Option<Connection>,
    pub is_executing_sql: bool,
    /// Published result; immutable once stored.
    pub sql_result_set: Option<Arc<ResultSet>>,
    pub execute_params: Option<ExecuteParams>,
}

impl Tab {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }
}

/// Partial update applied by [`TabStore::update_tab`]. `None` fields are
/// left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TabPatch {
    pub sql_result_set: Option<Arc<ResultSet>>,
    pub execute_params: Option<ExecuteParams>,
}

#[derive(Debug, Default)]
struct TabStoreInner {
    tabs: Vec<Tab>,
    current: Option<TabId>,
    next_id: u64,
}

impl TabStoreInner {
    fn find_mut(&mut self, id: &TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id.as_ref() == Some(id))
    }
}

/// Thread-safe store of editor tabs.
#[derive(Debug, Default)]
pub struct TabStore {
    inner: Mutex<TabStoreInner>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TabStoreInner> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a tab, makes it current, and returns its id.
    ///
    /// Tabs without an id are assigned the next sequential one.
    pub fn add_tab(&self, mut tab: Tab) -> TabId {
        let mut inner = self.lock();
        let id = match tab.id.clone() {
            Some(id) => id,
            None => {
                inner.next_id += 1;
                TabId::new(format!("tab-{}", inner.next_id))
            }
        };
        tab.id = Some(id.clone());
        inner.tabs.push(tab);
        inner.current = Some(id.clone());
        id
    }

    /// Makes an existing tab current.
    pub fn set_current(&self, id: &TabId) -> Result<()> {
        let mut inner = self.lock();
        if inner.find_mut(id).is_none() {
            return Err(WorkbenchError::internal(format!("Tab {id} not found")));
        }
        inner.current = Some(id.clone());
        Ok(())
    }

    pub fn current_tab_id(&self) -> Option<TabId> {
        self.lock().current.clone()
    }

    /// Returns a snapshot of the current tab.
    pub fn current_tab(&self) -> Option<Tab> {
        let inner = self.lock();
        let current = inner.current.as_ref()?;
        inner
            .tabs
            .iter()
            .find(|t| t.id.as_ref() == Some(current))
            .cloned()
    }

    /// Returns a snapshot of the given tab.
    pub fn tab(&self, id: &TabId) -> Option<Tab> {
        self.lock()
            .tabs
            .iter()
            .find(|t| t.id.as_ref() == Some(id))
            .cloned()
    }

    /// Returns true if the current tab has no connection (or there is no tab).
    pub fn is_disconnected(&self) -> bool {
        self.current_tab().map_or(true, |t| t.connection.is_none())
    }

    /// Applies a patch to a tab.
    pub fn update_tab(&self, id: &TabId, patch: TabPatch) -> Result<()> {
        let mut inner = self.lock();
        let tab = inner
            .find_mut(id)
            .ok_or_else(|| WorkbenchError::internal(format!("Tab {id} not found")))?;

        if let Some(result) = patch.sql_result_set {
            tab.sql_result_set = Some(result);
        }
        if let Some(params) = patch.execute_params {
            tab.execute_params = Some(params);
        }
        Ok(())
    }

    /// Sets the in-flight flag if it is clear. Returns false if the tab is
    /// already executing or does not exist.
    pub fn try_begin_execution(&self, id: &TabId) -> bool {
        let mut inner = self.lock();
        match inner.find_mut(id) {
            Some(tab) if !tab.is_executing_sql => {
                tab.is_executing_sql = true;
                true
            }
            _ => false,
        }
    }

    /// Clears the in-flight flag.
    pub fn finish_execution(&self, id: &TabId) {
        let mut inner = self.lock();
        match inner.find_mut(id) {
            Some(tab) => tab.is_executing_sql = false,
            None => warn!("Tab {} closed while executing", id),
        }
    }

    /// Removes a tab. The current tab moves to the last remaining one.
    pub fn remove_tab(&self, id: &TabId) -> Option<Tab> {
        let mut inner = self.lock();
        let pos = inner.tabs.iter().position(|t| t.id.as_ref() == Some(id))?;
        let tab = inner.tabs.remove(pos);
        if inner.current.as_ref() == Some(id) {
            inner.current = inner.tabs.last().and_then(|t| t.id.clone());
        }
        Some(tab)
    }
}
