/// Core Module for transwarp
///
/// The connection lifecycle and transaction nesting machinery, together with
/// the error type shared by the whole crate.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbError, Result};
