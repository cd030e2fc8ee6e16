//! Migration Ledger - durable record of each unit's applied version
//!
//! The ledger is the only thing the engine talks to at run time. It owns the
//! bookkeeping table and executes each step's commands together with the
//! version update, so a step is either fully applied and recorded or not at all.
//!
//! `execute` distinguishes two kinds of failure. `Ok(false)` means the step's
//! commands were rejected and rolled back; the engine stops that unit and moves
//! on. `Err(..)` means the ledger itself is unusable and aborts the run.

pub mod memory;
pub mod postgres;

pub use memory::{ExecutedStep, MemoryLedger};
pub use postgres::PostgresLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MigrationResult;

/// One row of the bookkeeping table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub id: String,
    pub version: i32,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Asynchronous ledger used by [`crate::MigrationEngine::migrate`]
#[async_trait]
pub trait MigrationLedger: Send + Sync {
    /// Create the bookkeeping table if it does not exist
    async fn ensure_bookkeeping_table(&self) -> MigrationResult<()>;

    /// Applied version of a unit, `None` when it has never been installed
    async fn find_applied_version(&self, unit_id: &str) -> MigrationResult<Option<i32>>;

    /// Execute `commands` and record `version` atomically
    ///
    /// Version 0 records an uninstall and removes the unit's row.
    async fn execute(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool>;

    /// Every recorded unit, ordered by identifier
    async fn applied_migrations(&self) -> MigrationResult<Vec<AppliedMigration>>;
}

/// Blocking counterpart of [`MigrationLedger`]
pub trait SyncMigrationLedger: Send + Sync {
    fn ensure_bookkeeping_table_sync(&self) -> MigrationResult<()>;

    fn find_applied_version_sync(&self, unit_id: &str) -> MigrationResult<Option<i32>>;

    fn execute_sync(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool>;

    fn applied_migrations_sync(&self) -> MigrationResult<Vec<AppliedMigration>>;
}
