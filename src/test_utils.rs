/// # Test Utilities Module
///
/// A connector that records every lifecycle call instead of talking to a
/// database, so tests can count connects, commits, rollbacks and closes.

use crate::config::EngineConfig;
use crate::core::db::driver::{Connector, DriverConnection, Fetch, ResultSet};
use crate::core::{DbError, Result};
use crate::sql::PlaceholderStyle;
use rusqlite::ffi;
use rusqlite::types::Value;
use std::sync::{Arc, Mutex};

/// Everything the recording connections saw
#[derive(Debug, Default)]
pub struct Events {
    pub connects: usize,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub closes: usize,
    /// Statements as the driver received them, with their arguments
    pub statements: Vec<(String, Vec<Value>)>,
}

pub type SharedEvents = Arc<Mutex<Events>>;

fn busy(message: &str) -> DbError {
    DbError::Driver(rusqlite::Error::SqliteFailure(
        ffi::Error::new(ffi::SQLITE_BUSY),
        Some(message.to_string()),
    ))
}

#[derive(Debug, Clone)]
pub struct RecordingConnector {
    events: SharedEvents,
    rows: ResultSet,
    style: PlaceholderStyle,
    fail_commit: bool,
    fail_rollback: bool,
    fail_close: bool,
    fail_execute: bool,
}

impl RecordingConnector {
    pub fn new() -> Self {
        RecordingConnector {
            events: Arc::new(Mutex::new(Events::default())),
            rows: ResultSet::default(),
            style: PlaceholderStyle::Qmark,
            fail_commit: false,
            fail_rollback: false,
            fail_close: false,
            fail_execute: false,
        }
    }

    pub fn events(&self) -> SharedEvents {
        Arc::clone(&self.events)
    }

    /// Rows every query on the connections will return
    pub fn with_rows(mut self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.rows = ResultSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        };
        self
    }

    pub fn with_style(mut self, style: PlaceholderStyle) -> Self {
        self.style = style;
        self
    }

    pub fn fail_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn fail_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn fail_execute(mut self) -> Self {
        self.fail_execute = true;
        self
    }
}

impl Connector for RecordingConnector {
    fn connect(&self, _config: &EngineConfig) -> Result<Box<dyn DriverConnection>> {
        self.events.lock().unwrap().connects += 1;
        Ok(Box::new(RecordingConnection {
            connector: self.clone(),
        }))
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        self.style
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

struct RecordingConnection {
    connector: RecordingConnector,
}

impl RecordingConnection {
    fn record(&self, sql: &str, args: &[Value]) {
        self.connector
            .events
            .lock()
            .unwrap()
            .statements
            .push((sql.to_string(), args.to_vec()));
    }
}

impl DriverConnection for RecordingConnection {
    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<usize> {
        self.record(sql, args);
        if self.connector.fail_execute {
            return Err(busy("database is locked"));
        }
        Ok(1)
    }

    fn fetch(&mut self, sql: &str, args: &[Value], fetch: Fetch) -> Result<ResultSet> {
        self.record(sql, args);
        let mut result = self.connector.rows.clone();
        if fetch == Fetch::One {
            result.rows.truncate(1);
        }
        Ok(result)
    }

    fn begin(&mut self) -> Result<()> {
        self.connector.events.lock().unwrap().begins += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.connector.events.lock().unwrap().commits += 1;
        if self.connector.fail_commit {
            return Err(busy("commit failed"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.connector.events.lock().unwrap().rollbacks += 1;
        if self.connector.fail_rollback {
            return Err(busy("rollback failed"));
        }
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.connector.events.lock().unwrap().closes += 1;
        if self.connector.fail_close {
            return Err(busy("close failed"));
        }
        Ok(())
    }
}
