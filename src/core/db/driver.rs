/// Driver Seam
///
/// The engine never talks to a concrete database client directly. A
/// [`Connector`] opens raw connections and a [`DriverConnection`] is the
/// cursor the query layer executes statements on.

use crate::config::EngineConfig;
use crate::core::Result;
use crate::sql::PlaceholderStyle;
use rusqlite::types::Value;

/// How many rows a fetch should pull from the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    One,
    All,
}

/// Column names plus raw row values, as produced by a driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// A single live connection to the database.
///
/// Implementations start in non-autocommit mode unless the engine config says
/// otherwise: statements accumulate until `commit` or `rollback`. Inside a
/// transaction scope `begin` is called before every statement, so a
/// connection opened with `autocommit = true` still groups the scope's work.
pub trait DriverConnection {
    /// Opens a transaction unless one is already open.
    fn begin(&mut self) -> Result<()>;

    /// Runs a statement that does not produce rows and returns the affected row count.
    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<usize>;

    /// Runs a query and collects its rows.
    fn fetch(&mut self, sql: &str, args: &[Value], fetch: Fetch) -> Result<ResultSet>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Closes the connection. Uncommitted work is discarded by the database.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Factory for raw connections, shared by every execution context of an engine.
pub trait Connector: Send + Sync {
    fn connect(&self, config: &EngineConfig) -> Result<Box<dyn DriverConnection>>;

    /// Placeholder syntax statements are rewritten to before execution
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Qmark
    }

    /// Short driver name for log lines
    fn name(&self) -> &'static str;
}
