//! Error types for the migration system
//!
//! Configuration errors (bad builder arguments, duplicate steps, operations a
//! generator cannot handle) are fatal and surface immediately. Ledger and
//! database failures abort the whole run. Soft step failures are not errors:
//! the ledger reports them with `Ok(false)`.

use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A required builder argument was missing or empty
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// An operation reached a generator that has no rule for it
    #[error("Unknown schema operation: {0}")]
    UnknownOperation(String),

    /// A unit declares the same step version twice in one direction
    #[error("Migration unit '{unit}' declares {direction} step version {version} more than once")]
    DuplicateStep {
        unit: String,
        direction: String,
        version: i32,
    },

    /// Two registered units share an identifier
    #[error("Migration unit '{0}' is registered more than once")]
    DuplicateUnit(String),

    /// A dialect has not supplied a generation rule
    #[error("Dialect '{dialect}' does not implement '{operation}'")]
    Unimplemented { dialect: String, operation: String },

    /// A logical type could not be mapped to a dialect type
    #[error("Type mapping error: {0}")]
    TypeMapping(String),

    /// Invalid engine or ledger configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unrecoverable ledger failure
    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The run was cancelled before the next unit or step started
    #[error("Migration run was cancelled")]
    Cancelled,
}

impl MigrationError {
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        MigrationError::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub fn unimplemented(dialect: impl Into<String>, operation: impl Into<String>) -> Self {
        MigrationError::Unimplemented {
            dialect: dialect.into(),
            operation: operation.into(),
        }
    }

    /// Whether this error comes from how units, builders or dialects are set up
    /// rather than from the database at run time
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MigrationError::InvalidArgument { .. }
                | MigrationError::UnknownOperation(_)
                | MigrationError::DuplicateStep { .. }
                | MigrationError::DuplicateUnit(_)
                | MigrationError::Unimplemented { .. }
                | MigrationError::TypeMapping(_)
                | MigrationError::Configuration(_)
        )
    }
}

/// Fail with `InvalidArgument` when `value` is empty or whitespace
pub(crate) fn require_non_empty(argument: &str, value: &str) -> MigrationResult<()> {
    if value.trim().is_empty() {
        return Err(MigrationError::invalid_argument(argument, "must not be empty"));
    }
    Ok(())
}

/// Fail with `InvalidArgument` when a list argument is empty or holds an empty entry
pub(crate) fn require_items<S: AsRef<str>>(argument: &str, values: &[S]) -> MigrationResult<()> {
    if values.is_empty() {
        return Err(MigrationError::invalid_argument(argument, "must contain at least one entry"));
    }
    for value in values {
        require_non_empty(argument, value.as_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(MigrationError::UnknownOperation("x".into()).is_configuration_error());
        assert!(MigrationError::unimplemented("ansi", "RenameTable").is_configuration_error());
        assert!(!MigrationError::Ledger("down".into()).is_configuration_error());
        assert!(!MigrationError::Cancelled.is_configuration_error());
    }

    #[test]
    fn test_require_items() {
        assert!(require_items::<&str>("columns", &[]).is_err());
        assert!(require_items("columns", &["id", " "]).is_err());
        assert!(require_items("columns", &["id", "name"]).is_ok());
    }

    #[test]
    fn test_error_messages() {
        let err = MigrationError::DuplicateStep {
            unit: "app::Users".into(),
            direction: "up".into(),
            version: 3,
        };
        assert_eq!(
            err.to_string(),
            "Migration unit 'app::Users' declares up step version 3 more than once"
        );
    }
}
