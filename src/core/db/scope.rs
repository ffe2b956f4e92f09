/// Connection and transaction scopes
///
/// Scopes are guards over an [`ExecutionContext`]. The first scope to find the
/// context uninitialized owns it and tears it down on exit; every scope nested
/// inside reuses the same lazy connection. Transaction scopes additionally
/// count nesting depth so that only the outermost one commits or rolls back.
///
/// Call `exit` to leave a scope. A scope that is dropped without `exit`
/// (early return, panic) is treated as failed.

use super::connection::ExecutionContext;
use crate::core::Result;
use std::ops::{Deref, DerefMut};
use std::time::Instant;
use tracing::{error, info, warn};

/// Scope that guarantees the context is initialized for its duration.
#[must_use = "dropping the scope immediately releases the connection"]
pub struct ConnectionScope<'c, 'e> {
    ctx: &'c mut ExecutionContext<'e>,
    should_cleanup: bool,
    exited: bool,
}

impl<'c, 'e> ConnectionScope<'c, 'e> {
    pub fn enter(ctx: &'c mut ExecutionContext<'e>) -> Result<Self> {
        let mut should_cleanup = false;
        if !ctx.is_initialized() {
            ctx.init()?;
            should_cleanup = true;
        }
        Ok(ConnectionScope {
            ctx,
            should_cleanup,
            exited: false,
        })
    }

    /// True if this scope initialized the context and will tear it down.
    pub fn is_owner(&self) -> bool {
        self.should_cleanup
    }

    pub fn exit(mut self) -> Result<()> {
        self.exited = true;
        if self.should_cleanup {
            self.ctx.cleanup()?;
        }
        Ok(())
    }
}

impl<'e> Deref for ConnectionScope<'_, 'e> {
    type Target = ExecutionContext<'e>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'e> DerefMut for ConnectionScope<'_, 'e> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ConnectionScope<'_, '_> {
    fn drop(&mut self) {
        if !self.exited && self.should_cleanup {
            if let Err(e) = self.ctx.cleanup() {
                warn!("cleanup of abandoned connection scope failed: {}", e);
            }
        }
    }
}

/// Scope that joins or begins a transaction.
#[must_use = "dropping the scope immediately rolls the transaction back"]
pub struct TransactionScope<'c, 'e> {
    ctx: &'c mut ExecutionContext<'e>,
    should_close_connection: bool,
    exited: bool,
    started: Instant,
}

impl<'c, 'e> TransactionScope<'c, 'e> {
    pub fn enter(ctx: &'c mut ExecutionContext<'e>) -> Result<Self> {
        let mut should_close_connection = false;
        if !ctx.is_initialized() {
            ctx.init()?;
            should_close_connection = true;
        }
        ctx.transactions += 1;
        if ctx.transactions == 1 {
            info!("begin transaction...");
        } else {
            info!("join current transaction (depth {})...", ctx.transactions);
        }
        Ok(TransactionScope {
            ctx,
            should_close_connection,
            exited: false,
            started: Instant::now(),
        })
    }

    /// True if this is the outermost transaction scope
    pub fn is_outermost(&self) -> bool {
        self.ctx.transactions == 1
    }

    /// Leaves the scope with the outcome of the guarded block.
    ///
    /// The outermost scope commits an `Ok` outcome and rolls back an `Err`.
    /// The connection is released afterwards if this scope owns it, whatever
    /// happened before.
    pub fn exit<T>(mut self, outcome: Result<T>) -> Result<T> {
        self.exited = true;
        self.ctx.transactions = self.ctx.transactions.saturating_sub(1);

        let result = if self.ctx.transactions == 0 {
            match outcome {
                Ok(value) => self.commit().map(|()| value),
                Err(e) => self.rollback().and(Err(e)),
            }
        } else {
            outcome
        };
        self.release(result)
    }

    /// Shorthand for `exit(Ok(()))`.
    pub fn finish(self) -> Result<()> {
        self.exit(Ok(()))
    }

    fn commit(&mut self) -> Result<()> {
        info!("commit transaction...");
        if !self.ctx.is_connected() {
            info!("no statement was issued, nothing to commit.");
            return Ok(());
        }
        match self.ctx.commit() {
            Ok(()) => {
                info!("commit ok in {:?}.", self.started.elapsed());
                Ok(())
            }
            Err(e) => {
                warn!("commit failed: {}. try rollback...", e);
                match self.ctx.rollback() {
                    Ok(()) => warn!("rollback ok."),
                    Err(rollback_err) => error!("rollback after failed commit failed: {}", rollback_err),
                }
                Err(e)
            }
        }
    }

    fn rollback(&mut self) -> Result<()> {
        warn!("rollback transaction...");
        if !self.ctx.is_connected() {
            info!("no statement was issued, nothing to roll back.");
            return Ok(());
        }
        self.ctx.rollback()?;
        info!("rollback ok.");
        Ok(())
    }

    fn release<T>(&mut self, result: Result<T>) -> Result<T> {
        if !self.should_close_connection {
            return result;
        }
        match (self.ctx.cleanup(), result) {
            (Ok(()), result) => result,
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(original)) => {
                warn!("closing connection after failed transaction failed: {}", e);
                Err(original)
            }
        }
    }
}

impl<'e> Deref for TransactionScope<'_, 'e> {
    type Target = ExecutionContext<'e>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'e> DerefMut for TransactionScope<'_, 'e> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for TransactionScope<'_, '_> {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        warn!("transaction scope left without exit, rolling back");
        self.ctx.transactions = self.ctx.transactions.saturating_sub(1);
        if self.ctx.transactions == 0 {
            if let Err(e) = self.rollback() {
                error!("rollback of abandoned transaction failed: {}", e);
            }
        }
        if self.should_close_connection {
            if let Err(e) = self.ctx.cleanup() {
                warn!("cleanup of abandoned transaction scope failed: {}", e);
            }
        }
    }
}

impl<'e> ExecutionContext<'e> {
    /// Runs `f` with an initialized context, releasing the connection
    /// afterwards if this call was the one that opened it.
    pub fn with_connection<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ExecutionContext<'e>) -> Result<T>,
    {
        let mut scope = ConnectionScope::enter(self)?;
        let outcome = f(&mut *scope);
        let released = scope.exit();
        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!("closing connection after failure failed: {}", cleanup);
                Err(e)
            }
        }
    }

    /// Runs `f` inside a transaction. Nested calls join the outer transaction;
    /// the outermost call commits if `f` succeeds and rolls back otherwise.
    pub fn with_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ExecutionContext<'e>) -> Result<T>,
    {
        let mut scope = TransactionScope::enter(self)?;
        let outcome = f(&mut *scope);
        scope.exit(outcome)
    }
}
