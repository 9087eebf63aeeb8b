//! SQL editor core.
//!
//! Tabs, editor-wide state, SQL review aggregation, and the executor that
//! ties them to the query backend.

pub mod advice;
mod executor;
mod state;
mod tab;

pub use advice::{aggregate_status, review_message};
pub use executor::{
    ExecutionGuard, ExecutionOutcome, RejectReason, SqlExecutor, DEFAULT_RESULT_ROWS_LIMIT,
};
pub use state::SqlEditorStore;
pub use tab::{ExecuteConfig, ExecuteOption, ExecuteParams, Tab, TabId, TabPatch, TabStore};
