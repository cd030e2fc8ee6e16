//! Migration Engine - drives every registered unit toward a target version
//!
//! Units run in priority order. For each unit the engine reads its applied
//! version, plans the steps toward the target, and hands every step's
//! generated commands to the ledger. A step the ledger rejects stops that unit
//! only; configuration and ledger errors abort the whole run.

pub mod planner;
pub mod registry;
pub mod report;

pub use planner::{plan_unit, PlannedStep, StepAction, TargetVersion};
pub use registry::{RegisteredUnit, UnitRegistry};
pub use report::{
    AppliedStep, MigrationReport, MigrationStatus, StepPreview, UnitOutcome, UnitPlan, UnitReport, UnitStatus,
};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::builder::MigrationBuilder;
use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::generator::MigrationSqlGenerator;
use crate::ledger::{AppliedMigration, MigrationLedger, SyncMigrationLedger};
use crate::unit::MigrationUnit;

/// Runs migration units against a ledger
pub struct MigrationEngine<L> {
    ledger: L,
    generator: Arc<dyn MigrationSqlGenerator>,
    config: MigrationConfig,
    registry: UnitRegistry,
}

impl<L> MigrationEngine<L> {
    pub fn new(ledger: L, generator: impl MigrationSqlGenerator + 'static) -> Self {
        Self::with_config(ledger, generator, MigrationConfig::default())
    }

    pub fn with_config(ledger: L, generator: impl MigrationSqlGenerator + 'static, config: MigrationConfig) -> Self {
        Self {
            ledger,
            generator: Arc::new(generator),
            config,
            registry: UnitRegistry::new(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Register a unit; non-persisted units are skipped
    pub fn register(&mut self, unit: impl MigrationUnit + 'static) -> MigrationResult<&mut Self> {
        self.register_arc(Arc::new(unit))
    }

    pub fn register_arc(&mut self, unit: Arc<dyn MigrationUnit>) -> MigrationResult<&mut Self> {
        self.registry.register(unit)?;
        Ok(self)
    }

    pub fn register_all<I>(&mut self, units: I) -> MigrationResult<&mut Self>
    where
        I: IntoIterator<Item = Arc<dyn MigrationUnit>>,
    {
        for unit in units {
            self.registry.register(unit)?;
        }
        Ok(self)
    }

    /// Build and generate the commands of one planned step
    fn prepare_step(&self, unit: &RegisteredUnit, step: &PlannedStep) -> MigrationResult<Vec<String>> {
        let mut builder = MigrationBuilder::with_default_schema(self.config.get_default_schema().clone());
        match &step.action {
            StepAction::Create => unit.unit().create(&mut builder)?,
            StepAction::Destroy => unit.unit().destroy(&mut builder)?,
            StepAction::Up(migration) | StepAction::Down(migration) => migration.apply(&mut builder)?,
        }

        let operations = builder.into_operations();
        let commands = self.generator.generate(&operations)?;
        if *self.config.get_log_commands() {
            for command in &commands {
                tracing::debug!(unit = unit.id(), version = step.version, "{}", command);
            }
        }
        Ok(commands)
    }

    fn plan_step_previews(&self, unit: &RegisteredUnit, applied: Option<i32>, target: TargetVersion) -> MigrationResult<UnitPlan> {
        let steps = plan_unit(unit, applied, target)
            .iter()
            .map(|step| {
                self.prepare_step(unit, step)
                    .map(|commands| StepPreview::new(&step.action, step.version, commands))
            })
            .collect::<MigrationResult<Vec<_>>>()?;
        Ok(UnitPlan {
            id: unit.id().to_string(),
            applied_version: applied,
            steps,
        })
    }

    fn unit_status(unit: &RegisteredUnit, applied: Option<i32>) -> UnitStatus {
        UnitStatus {
            id: unit.id().to_string(),
            priority: unit.priority(),
            applied_version: applied,
            latest_version: unit.latest_version(),
        }
    }

    fn orphaned(&self, applied: Vec<AppliedMigration>) -> Vec<AppliedMigration> {
        let known: HashSet<&str> = self.registry.iter().map(|u| u.id()).collect();
        applied.into_iter().filter(|m| !known.contains(m.id.as_str())).collect()
    }
}

fn parse_target(target_version: i32) -> MigrationResult<TargetVersion> {
    TargetVersion::try_from(target_version)
}

fn check_cancelled(cancellation: Option<&CancellationToken>) -> MigrationResult<()> {
    match cancellation {
        Some(token) if token.is_cancelled() => {
            tracing::info!("Migration run cancelled");
            Err(MigrationError::Cancelled)
        }
        _ => Ok(()),
    }
}

/// Log a run-aborting error with its context before propagating it
fn abort(unit: &str, version: Option<i32>, error: MigrationError) -> MigrationError {
    if !matches!(error, MigrationError::Cancelled) {
        tracing::error!(unit = unit, version = ?version, "Migration run aborted: {}", error);
    }
    error
}

/// Log and record a step's outcome; returns whether the unit may continue
fn record_step(
    unit: &RegisteredUnit,
    step: &PlannedStep,
    accepted: bool,
    commands: usize,
    report: &mut UnitReport,
) -> bool {
    if accepted {
        tracing::info!(
            "Applied {} step of {} (version {})",
            step.action.name(),
            unit.id(),
            step.version
        );
        report.applied(step, commands);
    } else {
        tracing::warn!(
            "Step {} of {} was rejected; skipping the rest of this unit",
            step.version,
            unit.id()
        );
        report.stopped(step);
    }
    accepted
}

fn start_run(units: usize, target: TargetVersion) -> Instant {
    tracing::info!("Migrating {} unit(s) to {}", units, target);
    Instant::now()
}

fn finish_run(mut report: MigrationReport, start_time: Instant) -> MigrationReport {
    report.execution_time_ms = start_time.elapsed().as_millis();
    tracing::info!(
        "Migration run finished: {} step(s) applied in {}ms",
        report.applied_count(),
        report.execution_time_ms
    );
    report
}

impl<L: MigrationLedger> MigrationEngine<L> {
    /// Migrate every unit to `target_version`: 0 for latest, -1 to uninstall,
    /// or a positive version
    pub async fn migrate(&self, target_version: i32) -> MigrationResult<MigrationReport> {
        self.run(parse_target(target_version)?, None).await
    }

    pub async fn migrate_with_cancellation(
        &self,
        target_version: i32,
        cancellation: &CancellationToken,
    ) -> MigrationResult<MigrationReport> {
        self.run(parse_target(target_version)?, Some(cancellation)).await
    }

    pub async fn migrate_to(&self, target: TargetVersion) -> MigrationResult<MigrationReport> {
        self.run(target.checked()?, None).await
    }

    async fn run(&self, target: TargetVersion, cancellation: Option<&CancellationToken>) -> MigrationResult<MigrationReport> {
        let start_time = start_run(self.registry.len(), target);

        check_cancelled(cancellation)?;
        self.ledger
            .ensure_bookkeeping_table()
            .await
            .map_err(|e| abort("<ledger>", None, e))?;

        let mut report = MigrationReport::default();
        for unit in self.registry.iter() {
            check_cancelled(cancellation)?;
            let applied = self
                .ledger
                .find_applied_version(unit.id())
                .await
                .map_err(|e| abort(unit.id(), None, e))?;

            let plan = plan_unit(unit, applied, target);
            let mut unit_report = UnitReport::new(unit.id(), applied);
            if plan.is_empty() {
                tracing::debug!("Unit {} is already at {:?}", unit.id(), applied);
            }

            for step in &plan {
                check_cancelled(cancellation)?;
                let commands = self
                    .prepare_step(unit, step)
                    .map_err(|e| abort(unit.id(), Some(step.version), e))?;
                let accepted = self
                    .ledger
                    .execute(unit.id(), step.version, &commands)
                    .await
                    .map_err(|e| abort(unit.id(), Some(step.version), e))?;

                if !record_step(unit, step, accepted, commands.len(), &mut unit_report) {
                    break;
                }
            }
            report.units.push(unit_report);
        }

        Ok(finish_run(report, start_time))
    }

    /// Dry run: the commands each unit would execute, without executing them
    pub async fn plan(&self, target_version: i32) -> MigrationResult<Vec<UnitPlan>> {
        let target = parse_target(target_version)?;
        self.ledger.ensure_bookkeeping_table().await?;
        let mut plans = Vec::with_capacity(self.registry.len());
        for unit in self.registry.iter() {
            let applied = self.ledger.find_applied_version(unit.id()).await?;
            plans.push(self.plan_step_previews(unit, applied, target)?);
        }
        Ok(plans)
    }

    /// Applied and latest version of every registered unit
    pub async fn status(&self) -> MigrationResult<MigrationStatus> {
        self.ledger.ensure_bookkeeping_table().await?;
        let mut units = Vec::with_capacity(self.registry.len());
        for unit in self.registry.iter() {
            let applied = self.ledger.find_applied_version(unit.id()).await?;
            units.push(Self::unit_status(unit, applied));
        }
        let orphaned = self.orphaned(self.ledger.applied_migrations().await?);
        Ok(MigrationStatus { units, orphaned })
    }
}

impl<L: SyncMigrationLedger> MigrationEngine<L> {
    /// Blocking counterpart of [`MigrationEngine::migrate`]
    pub fn migrate_blocking(&self, target_version: i32) -> MigrationResult<MigrationReport> {
        self.run_blocking(parse_target(target_version)?, None)
    }

    pub fn migrate_blocking_with_cancellation(
        &self,
        target_version: i32,
        cancellation: &CancellationToken,
    ) -> MigrationResult<MigrationReport> {
        self.run_blocking(parse_target(target_version)?, Some(cancellation))
    }

    fn run_blocking(&self, target: TargetVersion, cancellation: Option<&CancellationToken>) -> MigrationResult<MigrationReport> {
        let start_time = start_run(self.registry.len(), target);

        check_cancelled(cancellation)?;
        self.ledger
            .ensure_bookkeeping_table_sync()
            .map_err(|e| abort("<ledger>", None, e))?;

        let mut report = MigrationReport::default();
        for unit in self.registry.iter() {
            check_cancelled(cancellation)?;
            let applied = self
                .ledger
                .find_applied_version_sync(unit.id())
                .map_err(|e| abort(unit.id(), None, e))?;

            let plan = plan_unit(unit, applied, target);
            let mut unit_report = UnitReport::new(unit.id(), applied);
            if plan.is_empty() {
                tracing::debug!("Unit {} is already at {:?}", unit.id(), applied);
            }

            for step in &plan {
                check_cancelled(cancellation)?;
                let commands = self
                    .prepare_step(unit, step)
                    .map_err(|e| abort(unit.id(), Some(step.version), e))?;
                let accepted = self
                    .ledger
                    .execute_sync(unit.id(), step.version, &commands)
                    .map_err(|e| abort(unit.id(), Some(step.version), e))?;

                if !record_step(unit, step, accepted, commands.len(), &mut unit_report) {
                    break;
                }
            }
            report.units.push(unit_report);
        }

        Ok(finish_run(report, start_time))
    }

    pub fn plan_blocking(&self, target_version: i32) -> MigrationResult<Vec<UnitPlan>> {
        let target = parse_target(target_version)?;
        self.ledger.ensure_bookkeeping_table_sync()?;
        self.registry
            .iter()
            .map(|unit| {
                let applied = self.ledger.find_applied_version_sync(unit.id())?;
                self.plan_step_previews(unit, applied, target)
            })
            .collect()
    }

    pub fn status_blocking(&self) -> MigrationResult<MigrationStatus> {
        self.ledger.ensure_bookkeeping_table_sync()?;
        let units = self
            .registry
            .iter()
            .map(|unit| {
                self.ledger
                    .find_applied_version_sync(unit.id())
                    .map(|applied| Self::unit_status(unit, applied))
            })
            .collect::<MigrationResult<Vec<_>>>()?;
        let orphaned = self.orphaned(self.ledger.applied_migrations_sync()?);
        Ok(MigrationStatus { units, orphaned })
    }
}
