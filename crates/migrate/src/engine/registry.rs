//! Unit registration
//!
//! Discovers each unit's steps once, rejects duplicate step versions and
//! duplicate identifiers, and keeps units in run order: higher priority
//! first, registration order among equals.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{MigrationError, MigrationResult};
use crate::unit::{MigrationStep, MigrationUnit, StepDirection};

/// A unit with its steps discovered and sorted by version
#[derive(Clone)]
pub struct RegisteredUnit {
    id: String,
    priority: i32,
    unit: Arc<dyn MigrationUnit>,
    up_steps: Vec<MigrationStep>,
    down_steps: Vec<MigrationStep>,
}

impl RegisteredUnit {
    pub fn discover(unit: Arc<dyn MigrationUnit>) -> MigrationResult<Self> {
        let id = unit.id().into_owned();
        if id.trim().is_empty() {
            return Err(MigrationError::invalid_argument("id", "migration unit id must not be empty"));
        }

        let mut up_steps = Vec::new();
        let mut down_steps = Vec::new();
        let mut seen = HashSet::new();
        for step in unit.steps().into_steps() {
            if step.suffix() < 0 {
                return Err(MigrationError::invalid_argument(
                    "suffix",
                    format!("unit '{}' declares a negative step suffix {}", id, step.suffix()),
                ));
            }
            if !seen.insert((step.direction(), step.version())) {
                return Err(MigrationError::DuplicateStep {
                    unit: id,
                    direction: step.direction().to_string(),
                    version: step.version(),
                });
            }
            match step.direction() {
                StepDirection::Up => up_steps.push(step),
                StepDirection::Down => down_steps.push(step),
            }
        }
        up_steps.sort_by_key(MigrationStep::version);
        down_steps.sort_by_key(MigrationStep::version);

        Ok(Self {
            id,
            priority: unit.priority(),
            unit,
            up_steps,
            down_steps,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn unit(&self) -> &dyn MigrationUnit {
        self.unit.as_ref()
    }

    /// Up-steps in ascending version order
    pub fn up_steps(&self) -> &[MigrationStep] {
        &self.up_steps
    }

    /// Down-steps in ascending version order
    pub fn down_steps(&self) -> &[MigrationStep] {
        &self.down_steps
    }

    /// Highest version an upgrade to latest records
    pub fn latest_version(&self) -> i32 {
        self.up_steps.last().map(MigrationStep::version).unwrap_or(1).max(1)
    }
}

impl std::fmt::Debug for RegisteredUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredUnit")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("up_steps", &self.up_steps.len())
            .field("down_steps", &self.down_steps.len())
            .finish()
    }
}

/// Units in run order
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: Vec<RegisteredUnit>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit; returns `false` when it is not persisted and was skipped
    pub fn register(&mut self, unit: Arc<dyn MigrationUnit>) -> MigrationResult<bool> {
        if !unit.is_persisted() {
            tracing::debug!("Skipping non-persisted migration unit {}", unit.id());
            return Ok(false);
        }

        let registered = RegisteredUnit::discover(unit)?;
        if self.units.iter().any(|u| u.id == registered.id) {
            return Err(MigrationError::DuplicateUnit(registered.id));
        }

        tracing::debug!(
            "Registered migration unit {} (priority {}, {} up / {} down steps)",
            registered.id,
            registered.priority,
            registered.up_steps.len(),
            registered.down_steps.len()
        );
        self.units.push(registered);
        // stable: equal priorities keep registration order
        self.units.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredUnit> {
        self.units.iter()
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MigrationBuilder;
    use crate::unit::StepSet;
    use std::borrow::Cow;

    struct Named {
        id: &'static str,
        priority: i32,
        persisted: bool,
    }

    impl MigrationUnit for Named {
        fn id(&self) -> Cow<'static, str> {
            Cow::Borrowed(self.id)
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn is_persisted(&self) -> bool {
            self.persisted
        }

        fn create(&self, _builder: &mut MigrationBuilder) -> MigrationResult<()> {
            Ok(())
        }
    }

    fn named(id: &'static str, priority: i32) -> Arc<dyn MigrationUnit> {
        Arc::new(Named {
            id,
            priority,
            persisted: true,
        })
    }

    struct Doubled;

    impl MigrationUnit for Doubled {
        fn create(&self, _builder: &mut MigrationBuilder) -> MigrationResult<()> {
            Ok(())
        }

        fn steps(&self) -> StepSet {
            StepSet::new().up(2, |_| Ok(())).down(2, |_| Ok(())).up(2, |_| Ok(()))
        }
    }

    #[test]
    fn test_priority_order_is_stable() {
        let mut registry = UnitRegistry::new();
        registry.register(named("a", 0)).unwrap();
        registry.register(named("b", 10)).unwrap();
        registry.register(named("c", 0)).unwrap();
        registry.register(named("d", 10)).unwrap();

        let order: Vec<&str> = registry.iter().map(|u| u.id()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_duplicate_step_is_rejected() {
        let mut registry = UnitRegistry::new();
        match registry.register(Arc::new(Doubled)) {
            Err(MigrationError::DuplicateStep { direction, version, .. }) => {
                assert_eq!(direction, "up");
                assert_eq!(version, 3);
            }
            other => panic!("expected DuplicateStep, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_unit_and_non_persisted() {
        let mut registry = UnitRegistry::new();
        registry.register(named("a", 0)).unwrap();
        assert!(matches!(
            registry.register(named("a", 1)),
            Err(MigrationError::DuplicateUnit(id)) if id == "a"
        ));

        let skipped = registry
            .register(Arc::new(Named {
                id: "transient",
                priority: 0,
                persisted: false,
            }))
            .unwrap();
        assert!(!skipped);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_latest_version() {
        let unit = RegisteredUnit::discover(named("a", 0)).unwrap();
        assert_eq!(unit.latest_version(), 1);
    }
}
