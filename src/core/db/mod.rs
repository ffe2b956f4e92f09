/// Database Module
///
/// The connection lifecycle and transaction nesting machinery.
///
/// ## Architecture
///
/// - **Driver seam** (`driver.rs`): traits a concrete database client implements
/// - **SQLite driver** (`sqlite.rs`): the rusqlite-backed connector
/// - **Engine** (`engine.rs`): connection factory, one registered per process
/// - **Connection Management** (`connection.rs`): lazy connections and execution contexts
/// - **Scopes** (`scope.rs`): connection and nested transaction guards
/// - **Query Execution** (`query.rs`): select/update/insert helpers
/// - **Rows** (`row.rs`): named-field result records
///
/// ## Usage
///
/// ```no_run
/// use transwarp::core::db::create_engine;
/// use transwarp::config::EngineConfig;
/// use rusqlite::params;
///
/// # fn main() -> transwarp::core::Result<()> {
/// let engine = create_engine(EngineConfig::new("root", "secret", "app.db"))?;
/// let mut ctx = engine.context();
/// ctx.with_transaction(|ctx| {
///     ctx.insert("users", &[("name", &"alice"), ("age", &30)])?;
///     ctx.update("update users set age = ? where name = ?", params![31, "alice"])
/// })?;
/// # Ok(())
/// # }
/// ```
pub mod connection;
pub mod driver;
pub mod engine;
pub mod query;
pub mod row;
pub mod scope;
pub mod sqlite;

pub use connection::*;
pub use driver::*;
pub use engine::*;
pub use query::*;
pub use row::*;
pub use scope::*;
pub use sqlite::*;
