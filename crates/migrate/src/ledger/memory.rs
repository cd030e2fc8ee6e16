//! In-memory ledger for development and testing
//!
//! Records versions in a map and keeps a history of every executed step.
//! Failures can be scripted per (unit, version): a soft failure makes
//! `execute` return `Ok(false)`, a hard failure makes it return an error.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};

use super::{AppliedMigration, MigrationLedger, SyncMigrationLedger};
use crate::error::{MigrationError, MigrationResult};

/// A step the ledger executed and recorded
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStep {
    pub unit_id: String,
    pub version: i32,
    pub commands: Vec<String>,
}

#[derive(Debug, Default)]
struct LedgerState {
    records: BTreeMap<String, AppliedMigration>,
    history: Vec<ExecutedStep>,
    bookkeeping_checks: usize,
    soft_failures: HashSet<(String, i32)>,
    hard_failures: HashSet<(String, i32)>,
}

/// In-memory ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a unit's applied version
    pub fn with_version(self, unit_id: impl Into<String>, version: i32) -> Self {
        self.set_version(unit_id, version);
        self
    }

    /// Overwrite a unit's applied version; 0 removes the record
    pub fn set_version(&self, unit_id: impl Into<String>, version: i32) {
        let unit_id = unit_id.into();
        let mut state = self.state.lock();
        Self::record(&mut state, unit_id, version);
    }

    /// Make the step recording `version` for `unit_id` fail softly
    pub fn fail_step(&self, unit_id: impl Into<String>, version: i32) {
        self.state.lock().soft_failures.insert((unit_id.into(), version));
    }

    /// Make the step recording `version` for `unit_id` fail with an error
    pub fn error_on_step(&self, unit_id: impl Into<String>, version: i32) {
        self.state.lock().hard_failures.insert((unit_id.into(), version));
    }

    pub fn version_of(&self, unit_id: &str) -> Option<i32> {
        self.state.lock().records.get(unit_id).map(|r| r.version)
    }

    /// Every executed step, in execution order
    pub fn history(&self) -> Vec<ExecutedStep> {
        self.state.lock().history.clone()
    }

    pub fn clear_history(&self) {
        self.state.lock().history.clear();
    }

    /// How many times the bookkeeping table was checked
    pub fn bookkeeping_checks(&self) -> usize {
        self.state.lock().bookkeeping_checks
    }

    fn record(state: &mut LedgerState, unit_id: String, version: i32) {
        if version == 0 {
            state.records.remove(&unit_id);
        } else {
            state.records.insert(
                unit_id.clone(),
                AppliedMigration {
                    id: unit_id,
                    version,
                    applied_at: Some(Utc::now()),
                },
            );
        }
    }

    fn ensure(&self) -> MigrationResult<()> {
        self.state.lock().bookkeeping_checks += 1;
        Ok(())
    }

    fn find(&self, unit_id: &str) -> MigrationResult<Option<i32>> {
        Ok(self.version_of(unit_id))
    }

    fn apply(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool> {
        let mut state = self.state.lock();
        let key = (unit_id.to_string(), version);
        if state.hard_failures.contains(&key) {
            return Err(MigrationError::Ledger(format!(
                "Failed to record version {} for unit '{}'",
                version, unit_id
            )));
        }
        if state.soft_failures.contains(&key) {
            return Ok(false);
        }

        state.history.push(ExecutedStep {
            unit_id: unit_id.to_string(),
            version,
            commands: commands.to_vec(),
        });
        Self::record(&mut state, unit_id.to_string(), version);
        Ok(true)
    }

    fn list(&self) -> MigrationResult<Vec<AppliedMigration>> {
        Ok(self.state.lock().records.values().cloned().collect())
    }
}

#[async_trait]
impl MigrationLedger for MemoryLedger {
    async fn ensure_bookkeeping_table(&self) -> MigrationResult<()> {
        self.ensure()
    }

    async fn find_applied_version(&self, unit_id: &str) -> MigrationResult<Option<i32>> {
        self.find(unit_id)
    }

    async fn execute(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool> {
        self.apply(unit_id, version, commands)
    }

    async fn applied_migrations(&self) -> MigrationResult<Vec<AppliedMigration>> {
        self.list()
    }
}

impl SyncMigrationLedger for MemoryLedger {
    fn ensure_bookkeeping_table_sync(&self) -> MigrationResult<()> {
        self.ensure()
    }

    fn find_applied_version_sync(&self, unit_id: &str) -> MigrationResult<Option<i32>> {
        self.find(unit_id)
    }

    fn execute_sync(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool> {
        self.apply(unit_id, version, commands)
    }

    fn applied_migrations_sync(&self) -> MigrationResult<Vec<AppliedMigration>> {
        self.list()
    }
}
