//! Migration engine configuration and builder

use serde::{Deserialize, Serialize};
use service_builder::builder;
use std::env;

use crate::error::{MigrationError, MigrationResult};
use crate::identifier::validate_identifier;

/// Default name of the bookkeeping table
pub const DEFAULT_LEDGER_TABLE: &str = "__elif_schema_migrations";

/// Configuration for the migration engine and its ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder]
pub struct MigrationConfig {
    /// Name of the bookkeeping table that records applied versions
    #[builder(default = "DEFAULT_LEDGER_TABLE.to_string()", getter)]
    pub ledger_table: String,

    /// Schema holding the bookkeeping table
    #[builder(default, getter)]
    pub ledger_schema: Option<String>,

    /// Schema for tables whose entity does not name one
    #[builder(default, getter)]
    pub default_schema: Option<String>,

    /// Log every generated command at debug level
    #[builder(default = "true", getter)]
    pub log_commands: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            ledger_schema: None,
            default_schema: None,
            log_commands: true,
        }
    }
}

impl MigrationConfig {
    /// Load configuration from environment variables
    ///
    /// `ELIF_MIGRATIONS_TABLE`, `ELIF_MIGRATIONS_SCHEMA`,
    /// `ELIF_MIGRATIONS_DEFAULT_SCHEMA` and `ELIF_MIGRATIONS_LOG_COMMANDS`
    /// override the defaults when set.
    pub fn from_env() -> MigrationResult<Self> {
        let mut config = Self::default();

        if let Ok(table) = env::var("ELIF_MIGRATIONS_TABLE") {
            config.ledger_table = table;
        }
        config.ledger_schema = env::var("ELIF_MIGRATIONS_SCHEMA").ok().filter(|s| !s.is_empty());
        config.default_schema = env::var("ELIF_MIGRATIONS_DEFAULT_SCHEMA").ok().filter(|s| !s.is_empty());
        if let Ok(flag) = env::var("ELIF_MIGRATIONS_LOG_COMMANDS") {
            config.log_commands = flag.parse().map_err(|_| {
                MigrationError::Configuration(format!(
                    "ELIF_MIGRATIONS_LOG_COMMANDS must be 'true' or 'false', got '{}'",
                    flag
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that every configured name is a usable identifier
    pub fn validate(&self) -> MigrationResult<()> {
        validate_identifier(&self.ledger_table)?;
        if let Some(schema) = &self.ledger_schema {
            validate_identifier(schema)?;
        }
        if let Some(schema) = &self.default_schema {
            validate_identifier(schema)?;
        }
        Ok(())
    }
}

impl MigrationConfigBuilder {
    pub fn in_schema(self, schema: impl Into<String>) -> Self {
        self.default_schema(Some(schema.into()))
    }

    pub fn ledger_in_schema(self, schema: impl Into<String>) -> Self {
        self.ledger_schema(Some(schema.into()))
    }

    pub fn quiet(self) -> Self {
        self.log_commands(false)
    }

    pub fn build_config(self) -> MigrationConfig {
        self.build_with_defaults()
            .expect("Building MigrationConfig should not fail as all fields have defaults")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MigrationConfig::default();
        assert_eq!(config.ledger_table, DEFAULT_LEDGER_TABLE);
        assert!(config.ledger_schema.is_none());
        assert!(config.log_commands);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = MigrationConfig::builder()
            .ledger_table("schema_versions".to_string())
            .ledger_in_schema("ops")
            .in_schema("app")
            .quiet()
            .build_config();

        assert_eq!(config.get_ledger_table(), "schema_versions");
        assert_eq!(config.get_ledger_schema().as_deref(), Some("ops"));
        assert_eq!(config.get_default_schema().as_deref(), Some("app"));
        assert!(!*config.get_log_commands());
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        let config = MigrationConfig::builder()
            .ledger_table("bad table; --".to_string())
            .build_config();
        assert!(config.validate().is_err());
    }
}
