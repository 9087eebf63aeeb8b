//! db-workbench - the execution core of a SQL editor.
//!
//! This library exposes the core modules for the `workbench` binary and
//! integration tests.

pub mod backend;
pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod notify;
pub mod permission;
pub mod sql;
