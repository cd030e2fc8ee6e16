use async_trait::async_trait;
use elif_migrate::{
    AnsiDialect, AppliedMigration, BaseSqlGenerator, CancellationToken, MemoryLedger, MigrationBuilder,
    MigrationEngine, MigrationError, MigrationLedger, MigrationResult, MigrationUnit, StepSet, SyncMigrationLedger,
    TargetVersion, UnitOutcome,
};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Unit whose every step emits one marker statement naming itself
struct Versioned {
    id: &'static str,
    priority: i32,
    steps: i32,
}

impl Versioned {
    fn new(id: &'static str, steps: i32) -> Self {
        Self { id, priority: 0, steps }
    }

    fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

fn marker(builder: &mut MigrationBuilder, text: String) -> MigrationResult<()> {
    builder.sql(&text)?;
    Ok(())
}

impl MigrationUnit for Versioned {
    fn id(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.id)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn create(&self, builder: &mut MigrationBuilder) -> MigrationResult<()> {
        marker(builder, format!("-- {} create", self.id))
    }

    fn destroy(&self, builder: &mut MigrationBuilder) -> MigrationResult<()> {
        marker(builder, format!("-- {} destroy", self.id))
    }

    fn steps(&self) -> StepSet {
        let mut steps = StepSet::new();
        for suffix in 0..self.steps {
            let id = self.id;
            steps = steps
                .up(suffix, move |b| marker(b, format!("-- {} up {}", id, suffix + 1)))
                .down(suffix, move |b| marker(b, format!("-- {} down {}", id, suffix + 1)));
        }
        steps
    }
}

/// Unit whose creation uses an operation the base generator cannot handle
struct Exotic;

impl MigrationUnit for Exotic {
    fn id(&self) -> Cow<'static, str> {
        Cow::Borrowed("exotic")
    }

    fn create(&self, builder: &mut MigrationBuilder) -> MigrationResult<()> {
        builder.extension("CreateFulltextCatalog", serde_json::json!({"name": "docs"}))?;
        Ok(())
    }
}

/// Route engine logs to the test writer; set RUST_LOG to see them
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine(ledger: MemoryLedger) -> MigrationEngine<MemoryLedger> {
    init_tracing();
    MigrationEngine::new(ledger, BaseSqlGenerator::new(AnsiDialect))
}

fn executed(ledger: &MemoryLedger) -> Vec<(String, i32, String)> {
    ledger
        .history()
        .into_iter()
        .map(|step| (step.unit_id, step.version, step.commands.join(" ")))
        .collect()
}

fn entry(unit: &str, version: i32, command: &str) -> (String, i32, String) {
    (unit.to_string(), version, format!("{};", command))
}

#[tokio::test]
async fn test_fresh_install_runs_create_then_every_up_step() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 5)).unwrap();

    let report = engine.migrate(0).await.unwrap();

    assert_eq!(
        executed(engine.ledger()),
        vec![
            entry("users", 1, "-- users create"),
            entry("users", 1, "-- users up 1"),
            entry("users", 2, "-- users up 2"),
            entry("users", 3, "-- users up 3"),
            entry("users", 4, "-- users up 4"),
            entry("users", 5, "-- users up 5"),
        ]
    );
    assert_eq!(engine.ledger().version_of("users"), Some(5));

    let unit = report.unit("users").unwrap();
    assert_eq!(unit.initial_version, None);
    assert_eq!(unit.final_version, Some(5));
    assert_eq!(unit.outcome, UnitOutcome::Migrated);
    assert_eq!(report.applied_count(), 6);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 3)).unwrap();

    engine.migrate(0).await.unwrap();
    engine.ledger().clear_history();
    let report = engine.migrate(0).await.unwrap();

    assert!(engine.ledger().history().is_empty());
    assert_eq!(report.unit("users").unwrap().outcome, UnitOutcome::UpToDate);
}

#[tokio::test]
async fn test_explicit_target_excludes_its_own_step() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 5)).unwrap();

    engine.migrate(3).await.unwrap();

    assert_eq!(
        executed(engine.ledger()),
        vec![
            entry("users", 1, "-- users create"),
            entry("users", 1, "-- users up 1"),
            entry("users", 2, "-- users up 2"),
        ]
    );
    assert_eq!(engine.ledger().version_of("users"), Some(2));
}

#[tokio::test]
async fn test_upgrade_from_recorded_version() {
    let mut engine = engine(MemoryLedger::new().with_version("users", 3));
    engine.register(Versioned::new("users", 5)).unwrap();

    engine.migrate(0).await.unwrap();

    assert_eq!(
        executed(engine.ledger()),
        vec![entry("users", 4, "-- users up 4"), entry("users", 5, "-- users up 5")]
    );
}

#[tokio::test]
async fn test_downgrade_runs_down_steps_in_descending_order() {
    let mut engine = engine(MemoryLedger::new().with_version("users", 5));
    engine.register(Versioned::new("users", 5)).unwrap();

    let report = engine.migrate(2).await.unwrap();

    assert_eq!(
        executed(engine.ledger()),
        vec![
            entry("users", 4, "-- users down 5"),
            entry("users", 3, "-- users down 4"),
            entry("users", 2, "-- users down 3"),
        ]
    );
    assert_eq!(engine.ledger().version_of("users"), Some(2));
    assert_eq!(report.unit("users").unwrap().final_version, Some(2));
}

#[tokio::test]
async fn test_uninstall_destroys_and_removes_record() {
    let mut engine = engine(MemoryLedger::new().with_version("users", 3));
    engine.register(Versioned::new("users", 5)).unwrap();

    let report = engine.migrate(-1).await.unwrap();

    assert_eq!(
        executed(engine.ledger()),
        vec![
            entry("users", 2, "-- users down 3"),
            entry("users", 1, "-- users down 2"),
            entry("users", 1, "-- users down 1"),
            entry("users", 0, "-- users destroy"),
        ]
    );
    assert_eq!(engine.ledger().version_of("users"), None);
    assert_eq!(report.unit("users").unwrap().final_version, None);

    engine.ledger().clear_history();
    engine.migrate(-1).await.unwrap();
    assert!(engine.ledger().history().is_empty());
}

#[tokio::test]
async fn test_units_run_in_priority_order() {
    let mut engine = engine(MemoryLedger::new());
    engine
        .register(Versioned::new("low", 0))
        .unwrap()
        .register(Versioned::new("high", 0).with_priority(100))
        .unwrap()
        .register(Versioned::new("middle", 0).with_priority(10))
        .unwrap();

    engine.migrate(0).await.unwrap();

    let order: Vec<String> = engine.ledger().history().into_iter().map(|s| s.unit_id).collect();
    assert_eq!(order, vec!["high", "middle", "low"]);
}

#[tokio::test]
async fn test_rejected_step_stops_only_its_unit() {
    let ledger = MemoryLedger::new();
    ledger.fail_step("users", 3);
    let mut engine = engine(ledger);
    engine
        .register(Versioned::new("users", 5).with_priority(1))
        .unwrap()
        .register(Versioned::new("posts", 2))
        .unwrap();

    let report = engine.migrate(0).await.unwrap();

    assert_eq!(engine.ledger().version_of("users"), Some(2));
    assert_eq!(engine.ledger().version_of("posts"), Some(2));

    let users = report.unit("users").unwrap();
    assert_eq!(users.outcome, UnitOutcome::Stopped { failed_version: 3 });
    assert_eq!(users.final_version, Some(2));
    assert_eq!(report.unit("posts").unwrap().outcome, UnitOutcome::Migrated);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_ledger_error_aborts_the_run() {
    let ledger = MemoryLedger::new();
    ledger.error_on_step("users", 2);
    let mut engine = engine(ledger);
    engine
        .register(Versioned::new("users", 3).with_priority(1))
        .unwrap()
        .register(Versioned::new("posts", 1))
        .unwrap();

    let result = engine.migrate(0).await;

    assert!(matches!(result, Err(MigrationError::Ledger(_))));
    assert_eq!(engine.ledger().version_of("users"), Some(1));
    assert_eq!(engine.ledger().version_of("posts"), None);
}

#[tokio::test]
async fn test_unknown_operation_is_a_configuration_error() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Exotic).unwrap();

    match engine.migrate(0).await {
        Err(MigrationError::UnknownOperation(kind)) => assert_eq!(kind, "CreateFulltextCatalog"),
        other => panic!("expected UnknownOperation, got {:?}", other),
    }
    assert!(engine.ledger().history().is_empty());
    assert_eq!(engine.ledger().version_of("exotic"), None);
}

#[tokio::test]
async fn test_bookkeeping_table_checked_once_per_run() {
    let mut engine = engine(MemoryLedger::new());
    engine
        .register(Versioned::new("a", 2))
        .unwrap()
        .register(Versioned::new("b", 2))
        .unwrap();

    engine.migrate(0).await.unwrap();
    assert_eq!(engine.ledger().bookkeeping_checks(), 1);
}

#[tokio::test]
async fn test_cancelled_run_executes_nothing() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 2)).unwrap();

    let token = CancellationToken::new();
    token.cancel();

    let result = engine.migrate_with_cancellation(0, &token).await;
    assert!(matches!(result, Err(MigrationError::Cancelled)));
    assert!(engine.ledger().history().is_empty());
}

#[tokio::test]
async fn test_invalid_target_is_rejected() {
    let engine = engine(MemoryLedger::new());
    assert!(matches!(
        engine.migrate(-2).await,
        Err(MigrationError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn test_blocking_run_matches_async_run() {
    let units = || vec![Versioned::new("users", 4).with_priority(5), Versioned::new("posts", 2)];

    let mut async_engine = engine(MemoryLedger::new().with_version("users", 2));
    let mut blocking_engine = engine(MemoryLedger::new().with_version("users", 2));
    for unit in units() {
        async_engine.register(unit).unwrap();
    }
    for unit in units() {
        blocking_engine.register(unit).unwrap();
    }

    let async_report = async_engine.migrate(0).await.unwrap();
    let blocking_report = blocking_engine.migrate_blocking(0).unwrap();

    assert_eq!(executed(async_engine.ledger()), executed(blocking_engine.ledger()));
    assert_eq!(async_report.units, blocking_report.units);
}

#[test]
fn test_blocking_cancellation() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 1)).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    assert!(matches!(
        engine.migrate_blocking_with_cancellation(0, &token),
        Err(MigrationError::Cancelled)
    ));
    assert_eq!(engine.ledger().version_of("users"), None);
}

#[tokio::test]
async fn test_plan_does_not_execute() {
    let mut engine = engine(MemoryLedger::new().with_version("users", 1));
    engine.register(Versioned::new("users", 3)).unwrap();

    let plans = engine.plan(0).await.unwrap();

    assert_eq!(plans.len(), 1);
    let versions: Vec<i32> = plans[0].steps.iter().map(|s| s.version).collect();
    assert_eq!(versions, vec![2, 3]);
    assert_eq!(plans[0].steps[0].commands, vec!["-- users up 2;".to_string()]);
    assert!(engine.ledger().history().is_empty());
    assert_eq!(engine.ledger().version_of("users"), Some(1));
}

#[tokio::test]
async fn test_status_reports_pending_and_orphaned_units() {
    let ledger = MemoryLedger::new()
        .with_version("users", 3)
        .with_version("retired", 7);
    let mut engine = engine(ledger);
    engine
        .register(Versioned::new("users", 3))
        .unwrap()
        .register(Versioned::new("posts", 2))
        .unwrap();

    let status = engine.status().await.unwrap();

    let pending: Vec<&str> = status.pending().map(|u| u.id.as_str()).collect();
    assert_eq!(pending, vec!["posts"]);
    assert_eq!(status.orphaned.len(), 1);
    assert_eq!(status.orphaned[0].id, "retired");
}

#[tokio::test]
async fn test_migrate_to_typed_target() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 2)).unwrap();

    engine.migrate_to(TargetVersion::Latest).await.unwrap();
    assert_eq!(engine.ledger().version_of("users"), Some(2));

    engine.migrate_to(TargetVersion::Uninstall).await.unwrap();
    assert_eq!(engine.ledger().version_of("users"), None);
}

#[tokio::test]
async fn test_migrate_to_rejects_non_positive_exact_target() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 2)).unwrap();

    for target in [TargetVersion::Exact(0), TargetVersion::Exact(-5)] {
        let result = engine.migrate_to(target).await;
        assert!(matches!(result, Err(MigrationError::InvalidArgument { .. })));
    }
    assert!(engine.ledger().history().is_empty());
    assert_eq!(engine.ledger().bookkeeping_checks(), 0);
}

/// Ledger whose bookkeeping table does not exist until it is ensured
#[derive(Default)]
struct FreshDatabase {
    inner: MemoryLedger,
    table_ready: AtomicBool,
}

impl FreshDatabase {
    fn require_table(&self) -> MigrationResult<()> {
        if self.table_ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MigrationError::Ledger("bookkeeping table does not exist".to_string()))
        }
    }
}

#[async_trait]
impl MigrationLedger for FreshDatabase {
    async fn ensure_bookkeeping_table(&self) -> MigrationResult<()> {
        self.table_ready.store(true, Ordering::SeqCst);
        self.inner.ensure_bookkeeping_table().await
    }

    async fn find_applied_version(&self, unit_id: &str) -> MigrationResult<Option<i32>> {
        self.require_table()?;
        self.inner.find_applied_version(unit_id).await
    }

    async fn execute(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool> {
        self.require_table()?;
        self.inner.execute(unit_id, version, commands).await
    }

    async fn applied_migrations(&self) -> MigrationResult<Vec<AppliedMigration>> {
        self.require_table()?;
        self.inner.applied_migrations().await
    }
}

impl SyncMigrationLedger for FreshDatabase {
    fn ensure_bookkeeping_table_sync(&self) -> MigrationResult<()> {
        self.table_ready.store(true, Ordering::SeqCst);
        self.inner.ensure_bookkeeping_table_sync()
    }

    fn find_applied_version_sync(&self, unit_id: &str) -> MigrationResult<Option<i32>> {
        self.require_table()?;
        self.inner.find_applied_version_sync(unit_id)
    }

    fn execute_sync(&self, unit_id: &str, version: i32, commands: &[String]) -> MigrationResult<bool> {
        self.require_table()?;
        self.inner.execute_sync(unit_id, version, commands)
    }

    fn applied_migrations_sync(&self) -> MigrationResult<Vec<AppliedMigration>> {
        self.require_table()?;
        self.inner.applied_migrations_sync()
    }
}

#[tokio::test]
async fn test_plan_on_fresh_database_creates_bookkeeping_table() {
    let mut engine = MigrationEngine::new(FreshDatabase::default(), BaseSqlGenerator::new(AnsiDialect));
    engine.register(Versioned::new("users", 1)).unwrap();

    let plans = engine.plan(0).await.unwrap();

    let versions: Vec<i32> = plans[0].steps.iter().map(|s| s.version).collect();
    assert_eq!(versions, vec![1, 1]);
    assert!(engine.ledger().inner.history().is_empty());
}

#[test]
fn test_blocking_plan_on_fresh_database_creates_bookkeeping_table() {
    let mut engine = MigrationEngine::new(FreshDatabase::default(), BaseSqlGenerator::new(AnsiDialect));
    engine.register(Versioned::new("users", 2)).unwrap();

    let plans = engine.plan_blocking(0).unwrap();

    assert_eq!(plans[0].applied_version, None);
    assert_eq!(plans[0].steps.len(), 3);
    assert_eq!(engine.ledger().inner.bookkeeping_checks(), 1);
}

/// Log sink shared between the subscriber and the test
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_blocking_run_logs_start_and_finish() {
    let mut engine = engine(MemoryLedger::new());
    engine.register(Versioned::new("users", 1)).unwrap();

    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let report = tracing::subscriber::with_default(subscriber, || engine.migrate_blocking(0)).unwrap();

    assert_eq!(report.applied_count(), 2);
    let output = logs.contents();
    assert!(output.contains("Migrating 1 unit(s) to latest"));
    assert!(output.contains("Migration run finished: 2 step(s) applied"));
}
