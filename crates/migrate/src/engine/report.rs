//! Run results, dry-run plans and status

use serde::Serialize;

use super::planner::{PlannedStep, StepAction};
use crate::ledger::AppliedMigration;

/// How a unit's run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// Nothing to do
    UpToDate,
    /// Every planned step was applied
    Migrated,
    /// A step was rejected; later steps of this unit did not run
    Stopped { failed_version: i32 },
}

/// A step the ledger applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedStep {
    pub action: &'static str,
    pub version: i32,
    pub commands: usize,
}

/// Result of one unit's run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub id: String,
    pub initial_version: Option<i32>,
    pub final_version: Option<i32>,
    pub applied_steps: Vec<AppliedStep>,
    pub outcome: UnitOutcome,
}

impl UnitReport {
    pub(crate) fn new(id: &str, initial_version: Option<i32>) -> Self {
        Self {
            id: id.to_string(),
            initial_version,
            final_version: initial_version,
            applied_steps: Vec::new(),
            outcome: UnitOutcome::UpToDate,
        }
    }

    pub(crate) fn applied(&mut self, step: &PlannedStep, commands: usize) {
        self.final_version = if step.version == 0 { None } else { Some(step.version) };
        self.applied_steps.push(AppliedStep {
            action: step.action.name(),
            version: step.version,
            commands,
        });
        self.outcome = UnitOutcome::Migrated;
    }

    pub(crate) fn stopped(&mut self, step: &PlannedStep) {
        self.outcome = UnitOutcome::Stopped {
            failed_version: step.version,
        };
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Stopped { .. })
    }
}

/// Result of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub units: Vec<UnitReport>,
    pub execution_time_ms: u128,
}

impl MigrationReport {
    pub fn unit(&self, id: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Total steps applied across all units
    pub fn applied_count(&self) -> usize {
        self.units.iter().map(|u| u.applied_steps.len()).sum()
    }

    /// Units whose run stopped at a rejected step
    pub fn stopped_units(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|u| u.is_stopped())
    }

    pub fn is_success(&self) -> bool {
        self.stopped_units().next().is_none()
    }
}

/// One planned step and the commands it would execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepPreview {
    pub action: &'static str,
    pub version: i32,
    pub commands: Vec<String>,
}

impl StepPreview {
    pub(crate) fn new(action: &StepAction, version: i32, commands: Vec<String>) -> Self {
        Self {
            action: action.name(),
            version,
            commands,
        }
    }
}

/// Dry-run plan for one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitPlan {
    pub id: String,
    pub applied_version: Option<i32>,
    pub steps: Vec<StepPreview>,
}

/// Recorded and declared versions of one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitStatus {
    pub id: String,
    pub priority: i32,
    pub applied_version: Option<i32>,
    pub latest_version: i32,
}

impl UnitStatus {
    pub fn is_installed(&self) -> bool {
        self.applied_version.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.applied_version.map_or(true, |v| v < self.latest_version)
    }
}

/// Status of every registered unit, plus ledger rows no registered unit claims
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatus {
    pub units: Vec<UnitStatus>,
    pub orphaned: Vec<AppliedMigration>,
}

impl MigrationStatus {
    pub fn pending(&self) -> impl Iterator<Item = &UnitStatus> {
        self.units.iter().filter(|u| u.is_pending())
    }
}
