//! PostgreSQL ledger
//!
//! Each step runs in its own transaction together with the version upsert.
//! A database error raised by one of the step's commands rolls the
//! transaction back and is reported as a soft failure; connection and
//! protocol errors abort the run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use super::{AppliedMigration, MigrationLedger};
use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::identifier::quote_identifier;

/// SQL used against the bookkeeping table
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LedgerStatements {
    table: String,
}

impl LedgerStatements {
    pub(crate) fn new(config: &MigrationConfig) -> MigrationResult<Self> {
        config.validate()?;
        let table = match config.get_ledger_schema() {
            Some(schema) => format!(
                "{}.{}",
                quote_identifier(schema, '"'),
                quote_identifier(config.get_ledger_table(), '"')
            ),
            None => quote_identifier(config.get_ledger_table(), '"'),
        };
        Ok(Self { table })
    }

    pub(crate) fn create_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    id VARCHAR(255) PRIMARY KEY,\n    version INTEGER NOT NULL,\n    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()\n)",
            self.table
        )
    }

    pub(crate) fn find_version(&self) -> String {
        format!("SELECT version FROM {} WHERE id = $1", self.table)
    }

    pub(crate) fn upsert_version(&self) -> String {
        format!(
            "INSERT INTO {} (id, version, applied_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (id) DO UPDATE SET version = EXCLUDED.version, applied_at = EXCLUDED.applied_at",
            self.table
        )
    }

    pub(crate) fn delete_version(&self) -> String {
        format!("DELETE FROM {} WHERE id = $1", self.table)
    }

    pub(crate) fn list(&self) -> String {
        format!("SELECT id, version, applied_at FROM {} ORDER BY id", self.table)
    }
}

/// Ledger backed by a bookkeeping table in PostgreSQL
pub struct PostgresLedger {
    pool: PgPool,
    statements: LedgerStatements,
}

impl PostgresLedger {
    pub fn new(pool: PgPool, config: &MigrationConfig) -> MigrationResult<Self> {
        Ok(Self {
            pool,
            statements: LedgerStatements::new(config)?,
        })
    }

    /// Create a ledger from a database URL
    pub async fn connect(database_url: &str, config: &MigrationConfig) -> MigrationResult<Self> {
        let pool = PgPool::connect(database_url).await.map_err(|e| {
            MigrationError::Ledger(format!("Failed to connect to database: {}", e))
        })?;
        Self::new(pool, config)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MigrationLedger for PostgresLedger {
    async fn ensure_bookkeeping_table(&self) -> MigrationResult<()> {
        sqlx::query(&self.statements.create_table())
            .execute(&self.pool)
            .await?;
        tracing::debug!("Bookkeeping table {} is ready", self.statements.table);
        Ok(())
    }

    async fn find_applied_version(&self, unit_id: &str) -> MigrationResult<Option<i32>> {
        let row = sqlx::query(&self.statements.find_version())
            .bind(unit_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<i32, _>("version")?)),
            None => Ok(None),
        }
    }

    async fn execute(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|e| MigrationError::Ledger(format!("Failed to start transaction: {}", e)))?;

        for command in commands {
            match sqlx::query(command).execute(&mut *transaction).await {
                Ok(_) => {}
                Err(sqlx::Error::Database(e)) => {
                    tracing::warn!(
                        unit = unit_id,
                        version = version,
                        "Migration command rejected, rolling back: {}",
                        e
                    );
                    transaction.rollback().await.map_err(|e| {
                        MigrationError::Ledger(format!("Failed to roll back migration: {}", e))
                    })?;
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if version == 0 {
            sqlx::query(&self.statements.delete_version())
                .bind(unit_id)
                .execute(&mut *transaction)
                .await
                .map_err(|e| MigrationError::Ledger(format!("Failed to remove migration record: {}", e)))?;
        } else {
            sqlx::query(&self.statements.upsert_version())
                .bind(unit_id)
                .bind(version)
                .execute(&mut *transaction)
                .await
                .map_err(|e| MigrationError::Ledger(format!("Failed to record migration: {}", e)))?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| MigrationError::Ledger(format!("Failed to commit migration: {}", e)))?;
        Ok(true)
    }

    async fn applied_migrations(&self) -> MigrationResult<Vec<AppliedMigration>> {
        let rows = sqlx::query(&self.statements.list()).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> MigrationResult<AppliedMigration> {
                Ok(AppliedMigration {
                    id: row.try_get("id")?,
                    version: row.try_get("version")?,
                    applied_at: row.try_get::<Option<DateTime<Utc>>, _>("applied_at")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_use_configured_table() {
        let config = MigrationConfig::builder()
            .ledger_table("schema_versions".to_string())
            .ledger_in_schema("ops")
            .build_config();
        let statements = LedgerStatements::new(&config).unwrap();

        assert!(statements
            .create_table()
            .starts_with("CREATE TABLE IF NOT EXISTS \"ops\".\"schema_versions\" ("));
        assert_eq!(
            statements.find_version(),
            "SELECT version FROM \"ops\".\"schema_versions\" WHERE id = $1"
        );
        assert!(statements.upsert_version().contains("ON CONFLICT (id) DO UPDATE"));
        assert_eq!(
            statements.delete_version(),
            "DELETE FROM \"ops\".\"schema_versions\" WHERE id = $1"
        );
    }

    #[test]
    fn test_statements_reject_invalid_table() {
        let config = MigrationConfig::builder()
            .ledger_table("versions; DROP TABLE users".to_string())
            .build_config();
        assert!(LedgerStatements::new(&config).is_err());
    }
}
