//! Database error types.

use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur during database registration and lookup.
#[derive(Error, Debug)]
pub enum DbError {
    /// Driver-level error (connection, command, cursor).
    #[error("database driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// No database configuration section is present.
    #[error("database configuration is missing")]
    NotConfigured,

    /// The named database is not registered.
    #[error("database '{name}' is not registered")]
    MissingDatabase {
        /// The missing database name.
        name: String,
    },

    /// The named collection is not registered.
    #[error("collection '{collection}' is not registered in database '{db}'")]
    MissingCollection {
        /// The database name.
        db: String,
        /// The missing collection name.
        collection: String,
    },
}
