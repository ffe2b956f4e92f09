/// Query Execution Module
///
/// The select/update/insert helpers. Each one runs inside a connection scope,
/// so it works both inside an open scope (sharing its connection) and on a
/// bare context (opening and closing a connection around the single call).

use super::connection::{ExecutionContext, TransactionState};
use super::driver::{DriverConnection, Fetch};
use super::row::{rows_from, Row};
use crate::core::{DbError, Result};
use crate::logging::profiling;
use crate::sql::{build_insert, translate_placeholders};
use rusqlite::types::{FromSql, ToSql, ToSqlOutput, Value, ValueRef};
use std::time::Instant;
use tracing::info;

/// Result of [`ExecutionContext::select`]
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    One(Option<Row>),
    Many(Vec<Row>),
}

impl Selection {
    /// Flattens into a list of rows regardless of the variant
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Selection::One(row) => row.into_iter().collect(),
            Selection::Many(rows) => rows,
        }
    }
}

/// Converts bound arguments into owned values for logging and execution.
pub fn to_values(args: &[&dyn ToSql]) -> Result<Vec<Value>> {
    args.iter()
        .map(|arg| match arg.to_sql()? {
            ToSqlOutput::Borrowed(value) => Ok(Value::from(value)),
            ToSqlOutput::Owned(value) => Ok(value),
            _ => Err(DbError::Query("unsupported argument type".to_string())),
        })
        .collect()
}

impl<'e> ExecutionContext<'e> {
    /// Returns the first matching row, or `None` when nothing matched.
    pub fn select_one(&mut self, sql: &str, args: &[&dyn ToSql]) -> Result<Option<Row>> {
        match self.select(sql, true, args)? {
            Selection::One(row) => Ok(row),
            Selection::Many(rows) => Ok(rows.into_iter().next()),
        }
    }

    /// Returns every matching row in order.
    pub fn select_all(&mut self, sql: &str, args: &[&dyn ToSql]) -> Result<Vec<Row>> {
        Ok(self.select(sql, false, args)?.into_rows())
    }

    /// Runs a query expected to yield exactly one single-column row.
    ///
    /// A NULL scalar, such as `MAX(x)` over an empty table, comes back as `None`.
    pub fn select_int(&mut self, sql: &str, args: &[&dyn ToSql]) -> Result<Option<i64>> {
        let row = self.select_one(sql, args)?.ok_or(DbError::EmptyResult)?;
        if row.len() != 1 {
            return Err(DbError::MultiColumns(row.len()));
        }
        Ok(Option::<i64>::column_result(ValueRef::from(&row.values()[0]))?)
    }

    /// Runs a query and returns either its first row or all rows.
    pub fn select(&mut self, sql: &str, first: bool, args: &[&dyn ToSql]) -> Result<Selection> {
        let values = to_values(args)?;
        self.with_connection(|ctx| {
            let sql = ctx.native_sql(sql);
            info!("SQL: {}, ARGS: {:?}", sql, values);
            let threshold = ctx.engine().slow_query_threshold();
            let start = Instant::now();

            let fetch = if first { Fetch::One } else { Fetch::All };
            let result = ctx.statement_cursor()?.fetch(&sql, &values, fetch)?;
            profiling(start, &sql, threshold);

            let mut rows = rows_from(result);
            if first {
                Ok(Selection::One(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) }))
            } else {
                Ok(Selection::Many(rows))
            }
        })
    }

    /// Executes a mutating statement and returns the affected row count.
    ///
    /// Outside any transaction scope the change is committed right away.
    pub fn update(&mut self, sql: &str, args: &[&dyn ToSql]) -> Result<usize> {
        let values = to_values(args)?;
        self.execute_values(sql, values)
    }

    /// Inserts one row; `fields` are `(column, value)` pairs in column order.
    pub fn insert(&mut self, table: &str, fields: &[(&str, &dyn ToSql)]) -> Result<usize> {
        let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let sql = build_insert(table, &columns)?;
        let args: Vec<&dyn ToSql> = fields.iter().map(|(_, value)| *value).collect();
        self.execute_values(&sql, to_values(&args)?)
    }

    fn execute_values(&mut self, sql: &str, values: Vec<Value>) -> Result<usize> {
        self.with_connection(|ctx| {
            let sql = ctx.native_sql(sql);
            info!("SQL: {}, ARGS: {:?}", sql, values);
            let threshold = ctx.engine().slow_query_threshold();
            let start = Instant::now();

            let affected = ctx.statement_cursor()?.execute(&sql, &values)?;
            profiling(start, &sql, threshold);

            if ctx.transaction_state() == TransactionState::Autocommit {
                info!("auto commit");
                ctx.commit()?;
            }
            Ok(affected)
        })
    }

    /// The cursor to run the next statement on. Inside a transaction scope
    /// the driver is asked to hold a transaction open first.
    fn statement_cursor(&mut self) -> Result<&mut dyn DriverConnection> {
        let in_transaction = self.transaction_state() == TransactionState::Transaction;
        let cursor = self.cursor()?;
        if in_transaction {
            cursor.begin()?;
        }
        Ok(cursor)
    }

    fn native_sql(&self, sql: &str) -> String {
        translate_placeholders(sql, self.engine().placeholder_style())
    }
}
