/// Connection Management Module
///
/// [`LazyConnection`] defers opening a physical connection until a cursor is
/// actually needed, and [`ExecutionContext`] carries that connection plus the
/// transaction nesting depth for one thread of control.

use super::driver::DriverConnection;
use super::engine::{ConnectionId, Engine};
use crate::core::{DbError, Result};
use std::fmt;
use tracing::info;

/// Represents database transaction states
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransactionState {
    /// No transaction scope is open; writes commit immediately
    #[default]
    Autocommit,
    /// At least one transaction scope is open
    Transaction,
}

/// Wraps at most one raw connection, opened on first use.
pub struct LazyConnection<'e> {
    engine: &'e Engine,
    connection: Option<(ConnectionId, Box<dyn DriverConnection>)>,
}

impl<'e> LazyConnection<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        LazyConnection {
            engine,
            connection: None,
        }
    }

    /// Returns the cursor, connecting first if nothing is open yet.
    pub fn cursor(&mut self) -> Result<&mut dyn DriverConnection> {
        if self.connection.is_none() {
            let (id, conn) = self.engine.connect()?;
            info!("[CONNECTION] [OPEN] connection <{}>...", id);
            self.connection = Some((id, conn));
        }
        self.opened()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.opened()?.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.opened()?.rollback()
    }

    /// Closes the physical connection, if any. Calling it again does nothing.
    pub fn cleanup(&mut self) -> Result<()> {
        if let Some((id, conn)) = self.connection.take() {
            info!("[CONNECTION] [CLOSE] connection <{}>...", id);
            conn.close()?;
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(|(id, _)| *id)
    }

    fn opened(&mut self) -> Result<&mut dyn DriverConnection> {
        match self.connection.as_mut() {
            Some((_, conn)) => Ok(conn.as_mut()),
            None => Err(DbError::NotConnected),
        }
    }
}

impl fmt::Debug for LazyConnection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyConnection")
            .field("connection", &self.connection_id())
            .finish()
    }
}

impl Drop for LazyConnection<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            tracing::warn!("closing dropped connection failed: {}", e);
        }
    }
}

/// Connection and transaction state of one thread of control.
///
/// Driver connections carry no `Send` bound, so a context can never leave the
/// thread that created it. Every thread creates its own through
/// [`Engine::context`].
pub struct ExecutionContext<'e> {
    engine: &'e Engine,
    connection: Option<LazyConnection<'e>>,
    pub(crate) transactions: usize,
}

impl<'e> ExecutionContext<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        ExecutionContext {
            engine,
            connection: None,
            transactions: 0,
        }
    }

    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    pub fn is_initialized(&self) -> bool {
        self.connection.is_some()
    }

    /// Installs a fresh lazy connection and resets the transaction depth.
    pub fn init(&mut self) -> Result<()> {
        if self.is_initialized() {
            return Err(DbError::AlreadyInitialized("execution context"));
        }
        info!("open lazy connection...");
        self.connection = Some(LazyConnection::new(self.engine));
        self.transactions = 0;
        Ok(())
    }

    /// Closes the lazy connection and returns to the uninitialized state.
    pub fn cleanup(&mut self) -> Result<()> {
        let mut connection = self.connection.take().ok_or(DbError::NotInitialized)?;
        self.transactions = 0;
        connection.cleanup()
    }

    pub fn cursor(&mut self) -> Result<&mut dyn DriverConnection> {
        self.lazy()?.cursor()
    }

    /// True once a physical connection has been opened in this context.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().map_or(false, LazyConnection::is_connected)
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().and_then(LazyConnection::connection_id)
    }

    pub fn transaction_depth(&self) -> usize {
        self.transactions
    }

    pub fn transaction_state(&self) -> TransactionState {
        if self.transactions == 0 {
            TransactionState::Autocommit
        } else {
            TransactionState::Transaction
        }
    }

    pub(crate) fn commit(&mut self) -> Result<()> {
        self.lazy()?.commit()
    }

    pub(crate) fn rollback(&mut self) -> Result<()> {
        self.lazy()?.rollback()
    }

    fn lazy(&mut self) -> Result<&mut LazyConnection<'e>> {
        self.connection.as_mut().ok_or(DbError::NotInitialized)
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("connection", &self.connection)
            .field("transactions", &self.transactions)
            .finish()
    }
}
