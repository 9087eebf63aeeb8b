//! Editor-wide state shared by all tabs.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::backend::{QueryBackend, QueryHistory};
use crate::error::Result;

#[derive(Debug, Default)]
struct SqlEditorState {
    is_show_executing_hint: bool,
    query_history_list: Vec<QueryHistory>,
}

/// Holds the "open in change editor" hint and the query history list.
pub struct SqlEditorStore {
    backend: Arc<dyn QueryBackend>,
    state: Mutex<SqlEditorState>,
}

impl SqlEditorStore {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(SqlEditorState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SqlEditorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Shows or hides the hint offering to run a statement as a change.
    pub fn set_executing_hint(&self, show: bool) {
        self.lock().is_show_executing_hint = show;
    }

    pub fn is_show_executing_hint(&self) -> bool {
        self.lock().is_show_executing_hint
    }

    pub fn query_history_list(&self) -> Vec<QueryHistory> {
        self.lock().query_history_list.clone()
    }

    /// Reloads the query history list from the backend.
    ///
    /// On failure the previous list is kept. Returns the new list length.
    pub async fn fetch_query_history_list(&self) -> Result<usize> {
        let list = self.backend.list_query_history().await?;
        let len = list.len();
        self.lock().query_history_list = list;
        debug!("Query history refreshed ({} entries)", len);
        Ok(len)
    }
}

impl std::fmt::Debug for SqlEditorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlEditorStore")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
