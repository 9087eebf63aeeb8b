//! SQL syntax gate.
//!
//! Parses editor text before it is sent anywhere, so malformed statements
//! never reach the query execution service.

mod parser;

pub use parser::{is_read_only, ParseOutcome, SqlValidator};

use std::fmt;

/// SQL dialect used for parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SqlDialect {
    #[default]
    Generic,
    MySql,
    PostgreSql,
    Sqlite,
    MsSql,
    Snowflake,
    ClickHouse,
    Redshift,
}

impl SqlDialect {
    /// Picks the dialect for a database engine name (`MYSQL`, `POSTGRES`, ...).
    ///
    /// Unknown engines parse with the generic dialect.
    pub fn from_database_type(database_type: &str) -> Self {
        match database_type.trim().to_uppercase().as_str() {
            "MYSQL" | "TIDB" | "MARIADB" | "OCEANBASE" => Self::MySql,
            "POSTGRES" | "POSTGRESQL" => Self::PostgreSql,
            "SQLITE" => Self::Sqlite,
            "MSSQL" => Self::MsSql,
            "SNOWFLAKE" => Self::Snowflake,
            "CLICKHOUSE" => Self::ClickHouse,
            "REDSHIFT" => Self::Redshift,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::MySql => write!(f, "mysql"),
            Self::PostgreSql => write!(f, "postgresql"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::MsSql => write!(f, "mssql"),
            Self::Snowflake => write!(f, "snowflake"),
            Self::ClickHouse => write!(f, "clickhouse"),
            Self::Redshift => write!(f, "redshift"),
        }
    }
}
