//! Tests for the operator-facing CLI surface

use clap::Parser;
use rustmigrate::cli::{CliOutcome, MigrateArgs, run};
use rustmigrate::{Ledger, MemoryLedger, MigrateError, Registry, Step};

type Db = Vec<&'static str>;

fn registry() -> Registry<Db> {
    let mut registry = Registry::new();
    for (tag, level) in [("user_table_start", "mig0001"), ("user_table_add_column", "mig0002")] {
        registry
            .register(
                Step::new(tag)
                    .with_level(level)
                    .with_forward(move |db: &mut Db| {
                        db.push(tag);
                        Ok(())
                    })
                    .with_backward(|db: &mut Db| {
                        db.pop();
                        Ok(())
                    }),
            )
            .unwrap();
    }
    registry
}

fn args(argv: &[&str]) -> MigrateArgs {
    MigrateArgs::try_parse_from(std::iter::once("app").chain(argv.iter().copied())).unwrap()
}

fn run_args(
    argv: &[&str],
    registry: &Registry<Db>,
    db: &mut Db,
    ledger: &MemoryLedger,
) -> (anyhow::Result<CliOutcome>, String) {
    let mut out = Vec::new();
    let result = run(&args(argv), registry, db, ledger, None, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_version_flag() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();

    let (result, out) = run_args(&["--version"], &registry, &mut db, &ledger);
    assert!(matches!(result.unwrap(), CliOutcome::Version));
    assert!(out.starts_with("Version: "));
}

#[test]
fn test_list_on_empty_ledger_fails() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();

    let (result, _) = run_args(&["--list"], &registry, &mut db, &ledger);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("there is no migration done yet"));
}

#[test]
fn test_missing_from_or_to_is_rejected() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();

    let (result, _) = run_args(&["--to", "user_table_start", "--user", "alice"], &registry, &mut db, &ledger);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("no from-flag found"));

    let (result, _) = run_args(&["--from", "null", "--user", "alice"], &registry, &mut db, &ledger);
    assert!(result.unwrap_err().to_string().contains("no to-flag found"));
    assert!(ledger.is_empty().unwrap());
}

#[test]
fn test_missing_user_is_rejected() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();

    let (result, _) = run_args(&["--from", "null", "--to", "user_table_start"], &registry, &mut db, &ledger);
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MigrateError>(),
        Some(MigrateError::Validation(_))
    ));
    assert!(db.is_empty());
}

#[test]
fn test_default_operator_is_used() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();
    let mut out = Vec::new();

    run(
        &args(&["--from", "null", "--to", "user_table_start"]),
        &registry,
        &mut db,
        &ledger,
        Some("deploy-bot"),
        &mut out,
    )
    .unwrap();

    assert_eq!(ledger.current_state().unwrap().unwrap().operator, "deploy-bot");
}

#[test]
fn test_migrate_then_list() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();

    let (result, out) = run_args(
        &["--from", "null", "--to", "user_table_add_column", "--user", "alice"],
        &registry,
        &mut db,
        &ledger,
    );
    match result.unwrap() {
        CliOutcome::Migrated(report) => assert_eq!(report.applied.len(), 2),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(out.contains("UPGRADE"));
    assert_eq!(db, vec!["user_table_start", "user_table_add_column"]);

    let (result, out) = run_args(&["--history", "--no-color"], &registry, &mut db, &ledger);
    match result.unwrap() {
        CliOutcome::History(entries) => assert_eq!(entries.len(), 2),
        other => panic!("unexpected outcome: {:?}", other),
    }
    let current_row = out.lines().find(|l| l.contains("(current)")).unwrap();
    assert!(current_row.contains("user_table_add_column"));
}

#[test]
fn test_dry_run_does_not_execute() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();

    let (result, out) = run_args(
        &["--from", "null", "--to", "user_table_add_column", "--dry-run"],
        &registry,
        &mut db,
        &ledger,
    );
    match result.unwrap() {
        CliOutcome::Planned(plan) => assert_eq!(plan.transitions.len(), 2),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(out.lines().count(), 2);
    assert!(db.is_empty());
    assert!(ledger.is_empty().unwrap());
}

#[test]
fn test_already_at_target() {
    let registry = registry();
    let ledger = MemoryLedger::new();
    let mut db = Db::new();
    run_args(&["--from", "null", "--to", "user_table_start", "--user", "alice"], &registry, &mut db, &ledger)
        .0
        .unwrap();

    let (result, out) = run_args(
        &["--from", "user_table_start", "--to", "user_table_start", "--user", "alice"],
        &registry,
        &mut db,
        &ledger,
    );
    assert!(result.is_ok());
    assert!(out.contains("nothing to migrate"));
    assert_eq!(ledger.len().unwrap(), 1);
}
