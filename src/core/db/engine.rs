/// Engine Module
///
/// The engine owns the connection parameters and the driver connector. It is
/// built once, then handed by reference to every execution context that
/// needs to open connections.

use super::connection::ExecutionContext;
use super::driver::{Connector, DriverConnection};
use super::sqlite::SqliteConnector;
use crate::config::EngineConfig;
use crate::core::{DbError, Result};
use crate::sql::PlaceholderStyle;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// The process-wide engine registered by [`create_engine`].
static ENGINE: OnceCell<Engine> = OnceCell::new();

/// Serial number of a physical connection, for log correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Factory for raw driver connections
pub struct Engine {
    config: EngineConfig,
    connector: Box<dyn Connector>,
    next_connection_id: AtomicU64,
}

impl Engine {
    /// Builds an engine around `connector` after validating `config`.
    pub fn new(config: EngineConfig, connector: impl Connector + 'static) -> Result<Self> {
        config.validate()?;
        let engine = Engine {
            config,
            connector: Box::new(connector),
            next_connection_id: AtomicU64::new(1),
        };
        info!(
            "Init {} engine for database {} ok.",
            engine.connector.name(),
            engine.config.database
        );
        Ok(engine)
    }

    /// Builds an engine that opens SQLite databases.
    pub fn sqlite(config: EngineConfig) -> Result<Self> {
        Engine::new(config, SqliteConnector)
    }

    /// Opens a brand new physical connection.
    pub fn connect(&self) -> Result<(ConnectionId, Box<dyn DriverConnection>)> {
        let conn = self.connector.connect(&self.config)?;
        let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        Ok((id, conn))
    }

    /// A fresh, uninitialized execution context bound to this engine.
    ///
    /// Each thread of control should own its own context.
    pub fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(self)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        self.connector.placeholder_style()
    }

    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.config.slow_query_ms)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("driver", &self.connector.name())
            .field("config", &self.config)
            .field("next_connection_id", &self.next_connection_id)
            .finish()
    }
}

/// Creates and registers the process-wide SQLite engine.
pub fn create_engine(config: EngineConfig) -> Result<&'static Engine> {
    create_engine_with(config, SqliteConnector)
}

/// Creates and registers the process-wide engine with a custom connector.
///
/// Fails with [`DbError::AlreadyInitialized`] if an engine is already registered.
pub fn create_engine_with(config: EngineConfig, connector: impl Connector + 'static) -> Result<&'static Engine> {
    if ENGINE.get().is_some() {
        return Err(DbError::AlreadyInitialized("engine"));
    }
    let engine = Engine::new(config, connector)?;
    ENGINE
        .set(engine)
        .map_err(|_| DbError::AlreadyInitialized("engine"))?;
    engine_ref()
}

/// The engine registered by [`create_engine`].
pub fn engine() -> Result<&'static Engine> {
    engine_ref()
}

fn engine_ref() -> Result<&'static Engine> {
    ENGINE
        .get()
        .ok_or_else(|| DbError::Configuration("engine is not initialized".to_string()))
}
