//! # elif-migrate: Code-First Schema Migrations for elif.rs
//!
//! Applications describe their schema as migration units. Each unit is
//! versioned independently: `create` builds it, numbered steps evolve it, and
//! `destroy` removes it. The engine compares every unit's recorded version
//! with a target, builds the needed steps into schema operations, generates
//! dialect SQL for them, and hands the commands to a ledger that executes and
//! records each step atomically.
//!
//! ```no_run
//! use elif_migrate::{MigrationEngine, PostgresLedger, PostgresSqlGenerator, MigrationConfig};
//!
//! # async fn run(url: &str) -> elif_migrate::MigrationResult<()> {
//! let config = MigrationConfig::from_env()?;
//! let ledger = PostgresLedger::connect(url, &config).await?;
//! let engine = MigrationEngine::with_config(ledger, PostgresSqlGenerator::new(), config);
//! let report = engine.migrate(0).await?;
//! println!("applied {} step(s)", report.applied_count());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod entity;
pub mod error;
pub mod generator;
pub mod identifier;
pub mod ledger;
pub mod naming;
pub mod operations;
pub mod script;
pub mod unit;
pub mod value;

// Re-export core traits and types
pub use builder::{MigrationBuilder, OperationBuilder, TableBuilder};
pub use config::MigrationConfig;
pub use dialect::{AnsiDialect, Dialect, PostgresDialect, PostgresSqlGenerator, TypeFlags};
pub use engine::{MigrationEngine, MigrationReport, MigrationStatus, TargetVersion, UnitOutcome, UnitReport};
pub use entity::{ColumnMeta, Entity, EntityMeta, LogicalType};
pub use error::{MigrationError, MigrationResult};
pub use generator::{BaseSqlGenerator, MigrationSqlGenerator};
pub use ledger::{AppliedMigration, MemoryLedger, MigrationLedger, PostgresLedger, SyncMigrationLedger};
pub use operations::{Filter, ReferentialAction, SchemaOperation, TableName};
pub use script::ScriptBuilder;
pub use unit::{MigrationStep, MigrationUnit, StepDirection, StepSet};
pub use value::Value;

// Re-export for cancellation of long runs
pub use tokio_util::sync::CancellationToken;
