//! Migration units and their versioned steps
//!
//! A unit owns one slice of the schema. `create` builds that slice from
//! nothing, `destroy` removes it, and steps evolve it between versions. A step
//! declared with suffix `k` is filed under version `k + 1`.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::builder::MigrationBuilder;
use crate::error::MigrationResult;

/// Body of a migration step
pub type StepFn = Arc<dyn Fn(&mut MigrationBuilder) -> MigrationResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepDirection {
    Up,
    Down,
}

impl fmt::Display for StepDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepDirection::Up => write!(f, "up"),
            StepDirection::Down => write!(f, "down"),
        }
    }
}

/// One declared upgrade or downgrade step
#[derive(Clone)]
pub struct MigrationStep {
    direction: StepDirection,
    suffix: i32,
    apply: StepFn,
}

impl MigrationStep {
    pub fn new<F>(direction: StepDirection, suffix: i32, apply: F) -> Self
    where
        F: Fn(&mut MigrationBuilder) -> MigrationResult<()> + Send + Sync + 'static,
    {
        Self {
            direction,
            suffix,
            apply: Arc::new(apply),
        }
    }

    pub fn direction(&self) -> StepDirection {
        self.direction
    }

    /// Declared suffix
    pub fn suffix(&self) -> i32 {
        self.suffix
    }

    /// Version this step is filed under
    pub fn version(&self) -> i32 {
        self.suffix.saturating_add(1)
    }

    pub fn apply(&self, builder: &mut MigrationBuilder) -> MigrationResult<()> {
        (self.apply)(builder)
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("direction", &self.direction)
            .field("version", &self.version())
            .finish()
    }
}

/// Steps a unit declares, in declaration order
#[derive(Debug, Clone, Default)]
pub struct StepSet {
    steps: Vec<MigrationStep>,
}

impl StepSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the upgrade with suffix `suffix`
    pub fn up<F>(mut self, suffix: i32, apply: F) -> Self
    where
        F: Fn(&mut MigrationBuilder) -> MigrationResult<()> + Send + Sync + 'static,
    {
        self.steps.push(MigrationStep::new(StepDirection::Up, suffix, apply));
        self
    }

    /// Declare the downgrade with suffix `suffix`
    pub fn down<F>(mut self, suffix: i32, apply: F) -> Self
    where
        F: Fn(&mut MigrationBuilder) -> MigrationResult<()> + Send + Sync + 'static,
    {
        self.steps.push(MigrationStep::new(StepDirection::Down, suffix, apply));
        self
    }

    pub fn push(&mut self, step: MigrationStep) {
        self.steps.push(step);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationStep> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<MigrationStep> {
        self.steps
    }
}

/// A versioned, independently migratable slice of the schema
///
/// ```
/// use elif_migrate::{
///     ColumnMeta, Entity, EntityMeta, LogicalType, MigrationBuilder, MigrationResult, MigrationUnit, StepSet,
/// };
///
/// struct Account;
///
/// impl Entity for Account {
///     fn metadata() -> EntityMeta {
///         EntityMeta::new("Account")
///             .column(ColumnMeta::new("id", LogicalType::Int64))
///             .column(ColumnMeta::new("email", LogicalType::String).max_length(255))
///     }
/// }
///
/// struct AccountsUnit;
///
/// impl MigrationUnit for AccountsUnit {
///     fn create(&self, builder: &mut MigrationBuilder) -> MigrationResult<()> {
///         builder.create_table::<Account, _>(|table| {
///             table.all_columns()?;
///             Ok(())
///         })?;
///         Ok(())
///     }
///
///     fn destroy(&self, builder: &mut MigrationBuilder) -> MigrationResult<()> {
///         builder.drop_table::<Account>()?;
///         Ok(())
///     }
///
///     fn steps(&self) -> StepSet {
///         StepSet::new()
///             .up(1, |b| {
///                 b.create_index::<Account>(&["email"])?.unique();
///                 Ok(())
///             })
///             .down(1, |b| {
///                 b.drop_index::<Account>(&["email"])?;
///                 Ok(())
///             })
///     }
/// }
///
/// assert_eq!(AccountsUnit.steps().len(), 2);
/// ```
pub trait MigrationUnit: Send + Sync {
    /// Stable identifier used as the ledger key
    fn id(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Units with higher priority migrate first
    fn priority(&self) -> i32 {
        0
    }

    /// Units that are not persisted are skipped at registration
    fn is_persisted(&self) -> bool {
        true
    }

    /// Build the unit's schema from nothing; recorded as version 1
    fn create(&self, builder: &mut MigrationBuilder) -> MigrationResult<()>;

    /// Remove the unit's schema entirely
    fn destroy(&self, _builder: &mut MigrationBuilder) -> MigrationResult<()> {
        Ok(())
    }

    fn steps(&self) -> StepSet {
        StepSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl MigrationUnit for Empty {
        fn create(&self, _builder: &mut MigrationBuilder) -> MigrationResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_id_is_type_name() {
        assert!(Empty.id().ends_with("unit::tests::Empty"));
        assert_eq!(Empty.priority(), 0);
        assert!(Empty.is_persisted());
    }

    #[test]
    fn test_step_version_is_suffix_plus_one() {
        let steps = StepSet::new().up(1, |_| Ok(())).up(4, |_| Ok(())).down(2, |_| Ok(()));
        let versions: Vec<(StepDirection, i32)> = steps.iter().map(|s| (s.direction(), s.version())).collect();
        assert_eq!(
            versions,
            vec![
                (StepDirection::Up, 2),
                (StepDirection::Up, 5),
                (StepDirection::Down, 3)
            ]
        );
    }

    #[test]
    fn test_step_applies_to_builder() {
        let step = MigrationStep::new(StepDirection::Up, 1, |b: &mut MigrationBuilder| {
            b.sql("SELECT 1")?;
            Ok(())
        });
        let mut builder = MigrationBuilder::new();
        step.apply(&mut builder).unwrap();
        assert_eq!(builder.operations().len(), 1);
        assert_eq!(format!("{:?}", step), "MigrationStep { direction: Up, version: 2 }");
    }
}
