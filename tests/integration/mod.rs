//! Integration tests for the workbench.
//!
//! Exercise the public API only: tabs, executor, stores, the HTTP client and config loading.

pub mod execute_test;
pub mod http_test;
