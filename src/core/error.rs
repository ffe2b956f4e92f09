/// Transwarp Error Module
///
/// This module defines the error taxonomy of the data-access layer. Driver
/// failures pass through unchanged; the remaining variants cover violations of
/// the connection and transaction lifecycle owned by this crate.
use rusqlite::types::FromSqlError;
use thiserror::Error;

/// Error type for every fallible operation in transwarp.
#[derive(Error, Debug)]
pub enum DbError {
    /// Engine misconfigured, or used before it was created
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A one-time initialization was attempted twice
    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),

    /// The execution context was used before `init`
    #[error("Execution context is not initialized")]
    NotInitialized,

    /// Commit or rollback requested before any cursor was opened
    #[error("Lazy connection is not connected")]
    NotConnected,

    /// A single-column query returned some other number of columns
    #[error("Expect only one column, got {0}")]
    MultiColumns(usize),

    /// A scalar query matched no rows
    #[error("Query returned no rows")]
    EmptyResult,

    /// Statements this crate refuses to build (bad identifiers, empty inserts)
    #[error("Query error: {0}")]
    Query(String),

    /// Anything raised by the database driver, surfaced unchanged
    #[error("Database error: {0}")]
    Driver(#[from] rusqlite::Error),

    /// A column value could not be converted to the requested type
    #[error("Conversion error: {0}")]
    Conversion(#[from] FromSqlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use DbError as the error type.
pub type Result<T> = std::result::Result<T, DbError>;
