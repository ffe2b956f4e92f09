// Core infrastructure modules
pub mod core;

// Supporting modules
pub mod config;
pub mod id;
pub mod logging;
pub mod sql;

#[cfg(test)]
pub(crate) mod test_utils;

pub use crate::core::db::{
    create_engine, create_engine_with, engine, ConnectionScope, Engine, ExecutionContext, Row, Selection,
    TransactionScope,
};
pub use crate::core::{DbError, Result};
pub use rusqlite::params;
pub use rusqlite::types::Value;
