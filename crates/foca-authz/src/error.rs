//! Access-control error types.

use thiserror::Error;

/// Result type alias for access-control operations.
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Errors that can occur during access-control registration and
/// enforcement.
#[derive(Error, Debug)]
pub enum AuthzError {
    /// Policy engine error (model parsing, enforcement).
    #[error("policy engine error: {0}")]
    Policy(#[from] casbin::Error),

    /// Database error while reading or writing policy rules.
    #[error("policy storage error: {0}")]
    Storage(#[from] mongodb::error::Error),

    /// Database registration error.
    #[error(transparent)]
    Registry(#[from] foca_db::DbError),

    /// A permission identifier could not be parsed.
    #[error("invalid permission identifier: {id}")]
    InvalidId {
        /// The malformed identifier.
        id: String,
    },

    /// The referenced permission does not exist.
    #[error("permission '{id}' not found")]
    PermissionNotFound {
        /// The missing identifier.
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_id_display() {
        let err = AuthzError::InvalidId {
            id: "zzz".to_string(),
        };
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn test_not_found_display() {
        let err = AuthzError::PermissionNotFound {
            id: "abc".to_string(),
        };
        assert!(err.to_string().contains("abc"));
    }
}
