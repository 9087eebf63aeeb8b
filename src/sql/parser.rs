//! SQL parsing and read-only classification.
//!
//! Uses sqlparser-rs with the dialect matching the tab's database engine.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::{
    ClickHouseDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
};
use sqlparser::parser::{Parser, ParserError};

use super::SqlDialect;

/// Result of parsing editor text.
///
/// Exactly one of `data` and `error` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub data: Option<Vec<Statement>>,
    pub error: Option<String>,
}

impl ParseOutcome {
    /// Returns true if the text parsed.
    pub fn is_valid(&self) -> bool {
        self.data.is_some()
    }
}

/// Parses SQL text with a fixed dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlValidator {
    dialect: SqlDialect,
}

impl SqlValidator {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// Creates a validator for a database engine name.
    pub fn for_database_type(database_type: &str) -> Self {
        Self::new(SqlDialect::from_database_type(database_type))
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Parses `sql`, reporting either the statements or the parser error.
    pub fn parse_sql(&self, sql: &str) -> ParseOutcome {
        match self.parse(sql) {
            Ok(statements) => ParseOutcome {
                data: Some(statements),
                error: None,
            },
            Err(e) => ParseOutcome {
                data: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn parse(&self, sql: &str) -> Result<Vec<Statement>, ParserError> {
        match self.dialect {
            SqlDialect::Generic => Parser::parse_sql(&GenericDialect {}, sql),
            SqlDialect::MySql => Parser::parse_sql(&MySqlDialect {}, sql),
            SqlDialect::PostgreSql => Parser::parse_sql(&PostgreSqlDialect {}, sql),
            SqlDialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, sql),
            SqlDialect::MsSql => Parser::parse_sql(&MsSqlDialect {}, sql),
            SqlDialect::Snowflake => Parser::parse_sql(&SnowflakeDialect {}, sql),
            SqlDialect::ClickHouse => Parser::parse_sql(&ClickHouseDialect {}, sql),
            SqlDialect::Redshift => Parser::parse_sql(&RedshiftSqlDialect {}, sql),
        }
    }
}

/// Returns true if every statement in `sql` only reads data.
///
/// Unparseable or empty text is not read-only.
pub fn is_read_only(sql: &str) -> bool {
    match SqlValidator::default().parse_sql(sql).data {
        Some(statements) if !statements.is_empty() => {
            statements.iter().all(statement_is_read_only)
        }
        _ => false,
    }
}

fn statement_is_read_only(statement: &Statement) -> bool {
    match statement {
        // Query: may contain data-modifying CTEs, so recurse
        Statement::Query(query) => query_is_read_only(query),
        // EXPLAIN ANALYZE runs the inner statement
        Statement::Explain {
            analyze, statement, ..
        } => !*analyze || statement_is_read_only(statement),
        Statement::ExplainTable { .. }
        | Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. } => true,
        _ => false,
    }
}

fn query_is_read_only(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| query_is_read_only(&cte.query)));

    ctes_read_only && set_expr_is_read_only(&query.body)
}

fn set_expr_is_read_only(set_expr: &SetExpr) -> bool {
    match set_expr {
        SetExpr::Select(select) => select_is_read_only(select),
        SetExpr::Query(query) => query_is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left) && set_expr_is_read_only(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        // INSERT/UPDATE/DELETE/MERGE bodies
        _ => false,
    }
}

fn select_is_read_only(select: &Select) -> bool {
    select.from.iter().all(table_with_joins_is_read_only)
}

fn table_with_joins_is_read_only(twj: &TableWithJoins) -> bool {
    table_factor_is_read_only(&twj.relation)
        && twj
            .joins
            .iter()
            .all(|join| table_factor_is_read_only(&join.relation))
}

fn table_factor_is_read_only(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived { subquery, .. } => query_is_read_only(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => table_with_joins_is_read_only(table_with_joins),
        _ => true,
    }
}
