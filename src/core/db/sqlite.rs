/// SQLite driver backed by rusqlite
///
/// SQLite runs in autocommit mode by default. To give callers the same
/// "nothing is durable until commit" behaviour as a server database opened
/// with `autocommit = false`, a deferred `BEGIN` is issued in front of the
/// first statement after connect, commit or rollback.

use super::driver::{Connector, DriverConnection, Fetch, ResultSet};
use crate::config::EngineConfig;
use crate::core::Result;
use crate::sql::{check_identifier, check_option_value, PlaceholderStyle};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

/// Opens SQLite databases; `EngineConfig::database` is the file path.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    fn connect(&self, config: &EngineConfig) -> Result<Box<dyn DriverConnection>> {
        let conn = Connection::open(&config.database)?;

        for (key, value) in &config.options {
            let key = check_identifier(key)?;
            let value = check_option_value(value)?;
            debug!("PRAGMA {} = {}", key, value);
            conn.execute_batch(&format!("PRAGMA {} = {};", key, value))?;
        }

        Ok(Box::new(SqliteConnection {
            conn,
            autocommit: config.autocommit,
        }))
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
    autocommit: bool,
}

impl SqliteConnection {
    fn ensure_transaction(&self) -> Result<()> {
        if !self.autocommit {
            self.begin_deferred()?;
        }
        Ok(())
    }

    fn begin_deferred(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN DEFERRED")?;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

impl DriverConnection for SqliteConnection {
    fn begin(&mut self) -> Result<()> {
        self.begin_deferred()
    }

    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<usize> {
        self.ensure_transaction()?;
        let mut stmt = self.conn.prepare(sql)?;
        Ok(stmt.execute(params_from_iter(args.iter()))?)
    }

    fn fetch(&mut self, sql: &str, args: &[Value], fetch: Fetch) -> Result<ResultSet> {
        self.ensure_transaction()?;
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(column_count);
            for i in 0..column_count {
                record.push(row.get::<_, Value>(i)?);
            }
            values.push(record);
            if fetch == Fetch::One {
                break;
            }
        }

        Ok(ResultSet { columns, rows: values })
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
