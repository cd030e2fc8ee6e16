//! Step planning
//!
//! Given a unit's applied version and a target, decide which steps run and
//! which version each one records. Planning is pure; the engine executes the
//! plan against the ledger.
//!
//! Upgrades from an absent record run `create` (recorded as version 1) and
//! then every up-step below the target, including a step declared with
//! version 1. Explicit targets are exclusive: `Exact(5)` runs up-steps with
//! versions below 5. Downgrades run down-steps in descending order, each
//! recording one version below its own (never below 1), and an uninstall
//! finishes with `destroy`, recorded as version 0.

use std::fmt;

use super::registry::RegisteredUnit;
use crate::error::{MigrationError, MigrationResult};
use crate::unit::MigrationStep;

/// Version a run migrates every unit toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetVersion {
    /// The newest declared version
    #[default]
    Latest,
    /// Remove the unit entirely
    Uninstall,
    /// A specific version, greater than zero
    Exact(i32),
}

impl TargetVersion {
    /// Integer form: 0 for latest, -1 for uninstall
    pub fn raw(&self) -> i32 {
        match self {
            TargetVersion::Latest => 0,
            TargetVersion::Uninstall => -1,
            TargetVersion::Exact(version) => *version,
        }
    }

    /// Reject `Exact` versions that are not positive
    pub fn checked(self) -> MigrationResult<Self> {
        match self {
            TargetVersion::Exact(v) if v <= 0 => Err(MigrationError::invalid_argument(
                "target_version",
                format!("explicit target {} must be greater than zero", v),
            )),
            other => Ok(other),
        }
    }

    fn upper_bound(&self) -> i32 {
        match self {
            TargetVersion::Latest => i32::MAX,
            other => other.raw(),
        }
    }
}

impl TryFrom<i32> for TargetVersion {
    type Error = MigrationError;

    fn try_from(value: i32) -> MigrationResult<Self> {
        match value {
            0 => Ok(TargetVersion::Latest),
            -1 => Ok(TargetVersion::Uninstall),
            v if v > 0 => Ok(TargetVersion::Exact(v)),
            v => Err(MigrationError::invalid_argument(
                "target_version",
                format!("{} is not a valid target; use 0 for latest, -1 to uninstall", v),
            )),
        }
    }
}

impl fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetVersion::Latest => write!(f, "latest"),
            TargetVersion::Uninstall => write!(f, "uninstall"),
            TargetVersion::Exact(version) => write!(f, "{}", version),
        }
    }
}

/// What a planned step does
#[derive(Debug, Clone)]
pub enum StepAction {
    Create,
    Up(MigrationStep),
    Down(MigrationStep),
    Destroy,
}

impl StepAction {
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Create => "create",
            StepAction::Up(_) => "up",
            StepAction::Down(_) => "down",
            StepAction::Destroy => "destroy",
        }
    }
}

/// One step of a unit's plan and the version it records
#[derive(Debug, Clone)]
pub struct PlannedStep {
    pub action: StepAction,
    pub version: i32,
}

/// Plan the steps that move `unit` from `applied` toward `target`
pub fn plan_unit(unit: &RegisteredUnit, applied: Option<i32>, target: TargetVersion) -> Vec<PlannedStep> {
    match applied {
        None if target == TargetVersion::Uninstall => Vec::new(),
        Some(current) if current == target.raw() => Vec::new(),
        None => plan_upgrade(unit, None, target),
        Some(current) if target != TargetVersion::Uninstall && current < target.upper_bound() => {
            plan_upgrade(unit, Some(current), target)
        }
        Some(current) => plan_downgrade(unit, current, target),
    }
}

fn plan_upgrade(unit: &RegisteredUnit, applied: Option<i32>, target: TargetVersion) -> Vec<PlannedStep> {
    let mut plan = Vec::new();
    if applied.is_none() {
        plan.push(PlannedStep {
            action: StepAction::Create,
            version: 1,
        });
    }

    let current = applied.unwrap_or(0);
    let bound = target.upper_bound();
    plan.extend(
        unit.up_steps()
            .iter()
            .filter(|step| step.version() > current && step.version() < bound)
            .map(|step| PlannedStep {
                action: StepAction::Up(step.clone()),
                version: step.version(),
            }),
    );
    plan
}

fn plan_downgrade(unit: &RegisteredUnit, current: i32, target: TargetVersion) -> Vec<PlannedStep> {
    let floor = target.raw();
    let mut plan: Vec<PlannedStep> = unit
        .down_steps()
        .iter()
        .rev()
        .filter(|step| step.version() > floor && step.version() <= current)
        .map(|step| PlannedStep {
            action: StepAction::Down(step.clone()),
            version: (step.version() - 1).max(1),
        })
        .collect();

    if target == TargetVersion::Uninstall {
        plan.push(PlannedStep {
            action: StepAction::Destroy,
            version: 0,
        });
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MigrationBuilder;
    use crate::unit::{MigrationUnit, StepSet};
    use std::sync::Arc;

    struct Fixture;

    impl MigrationUnit for Fixture {
        fn create(&self, _builder: &mut MigrationBuilder) -> MigrationResult<()> {
            Ok(())
        }

        fn steps(&self) -> StepSet {
            let mut steps = StepSet::new();
            for suffix in 0..5 {
                steps = steps.up(suffix, |_| Ok(())).down(suffix, |_| Ok(()));
            }
            steps
        }
    }

    fn unit() -> RegisteredUnit {
        RegisteredUnit::discover(Arc::new(Fixture)).unwrap()
    }

    fn summary(plan: &[PlannedStep]) -> Vec<(&'static str, i32)> {
        plan.iter().map(|s| (s.action.name(), s.version)).collect()
    }

    #[test]
    fn test_target_from_integer() {
        assert_eq!(TargetVersion::try_from(0).unwrap(), TargetVersion::Latest);
        assert_eq!(TargetVersion::try_from(-1).unwrap(), TargetVersion::Uninstall);
        assert_eq!(TargetVersion::try_from(3).unwrap(), TargetVersion::Exact(3));
        assert!(TargetVersion::try_from(-2).is_err());
    }

    #[test]
    fn test_exact_target_must_be_positive() {
        assert_eq!(TargetVersion::Exact(3).checked().unwrap(), TargetVersion::Exact(3));
        assert_eq!(TargetVersion::Latest.checked().unwrap(), TargetVersion::Latest);
        assert_eq!(TargetVersion::Uninstall.checked().unwrap(), TargetVersion::Uninstall);
        assert!(matches!(
            TargetVersion::Exact(0).checked(),
            Err(MigrationError::InvalidArgument { .. })
        ));
        assert!(TargetVersion::Exact(-5).checked().is_err());
    }

    #[test]
    fn test_fresh_install_runs_create_then_all_up_steps() {
        let plan = plan_unit(&unit(), None, TargetVersion::Latest);
        assert_eq!(
            summary(&plan),
            vec![("create", 1), ("up", 1), ("up", 2), ("up", 3), ("up", 4), ("up", 5)]
        );
    }

    #[test]
    fn test_explicit_target_is_exclusive() {
        let plan = plan_unit(&unit(), Some(2), TargetVersion::Exact(5));
        assert_eq!(summary(&plan), vec![("up", 3), ("up", 4)]);
    }

    #[test]
    fn test_downgrade_records_one_below_each_step() {
        let plan = plan_unit(&unit(), Some(5), TargetVersion::Exact(2));
        assert_eq!(summary(&plan), vec![("down", 4), ("down", 3), ("down", 2)]);
    }

    #[test]
    fn test_uninstall_ends_with_destroy() {
        let plan = plan_unit(&unit(), Some(3), TargetVersion::Uninstall);
        assert_eq!(
            summary(&plan),
            vec![("down", 2), ("down", 1), ("down", 1), ("destroy", 0)]
        );
        assert!(plan_unit(&unit(), None, TargetVersion::Uninstall).is_empty());
    }

    #[test]
    fn test_matching_version_is_skipped() {
        assert!(plan_unit(&unit(), Some(4), TargetVersion::Exact(4)).is_empty());
    }
}
