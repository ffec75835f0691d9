//! Migration executor.
//!
//! Walks the ordered step sequence from the state the operator claims to be
//! current towards a target, one adjacent transition at a time:
//!
//! ```text
//! null ─▶ A ─▶ B ─▶ C        upgrade: any distance, forward actions
//! null ◀─ A ◀─ B ◀─ C        downgrade: exactly one step, backward action
//! ```
//!
//! The ledger is re-read at the start of every invocation and the claimed
//! `from` tag must match it. After each successful action the new state is
//! appended before the next action runs, so a failure leaves the ledger at
//! the last step that actually completed.

mod plan;

pub use plan::{MigrationPlan, MigrationReport, Transition};

use tracing::{Level, event, info_span};

use crate::core::{Direction, MigrateError, Position, Result, is_null_tag};
use crate::ledger::{Ledger, LedgerEntry};
use crate::registry::Registry;

pub struct Executor<'r, C, L> {
    registry: &'r Registry<C>,
    ledger: L,
}

impl<C, L: std::fmt::Debug> std::fmt::Debug for Executor<'_, C, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("steps", &self.registry.len())
            .field("ledger", &self.ledger)
            .finish()
    }
}

impl<'r, C, L: Ledger> Executor<'r, C, L> {
    /// Creates an executor over a fully populated registry.
    ///
    /// Runs the registry's consistency check once; a step without both
    /// actions is a fatal precondition violation.
    pub fn new(registry: &'r Registry<C>, ledger: L) -> Result<Self> {
        registry.consistency_check()?;
        Ok(Self { registry, ledger })
    }

    pub fn registry(&self) -> &Registry<C> {
        self.registry
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Current ledger state, with an empty-ledger error read as `None`.
    pub fn current_state(&self) -> Result<Option<LedgerEntry>> {
        match self.ledger.current_state() {
            Ok(state) => Ok(state),
            Err(MigrateError::EmptyLedger) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Checks `from` against the ledger and resolves the walk to `to`
    /// without running any action.
    pub fn plan(&self, from: &str, to: &str) -> Result<MigrationPlan> {
        if self.registry.is_empty() {
            return Err(MigrateError::EmptyRegistry);
        }

        self.check_claimed_state(from)?;

        let from_pos = self.resolve(from, "from-code")?;
        let to_pos = self.resolve(to, "to-code")?;

        let (direction, transitions) = if from_pos < to_pos {
            let mut transitions = Vec::new();
            let mut cursor = from_pos;
            while cursor < to_pos {
                let next = cursor.next();
                transitions.push(self.transition(Direction::Upgrade, cursor, next)?);
                cursor = next;
            }
            (Some(Direction::Upgrade), transitions)
        } else if from_pos > to_pos {
            let steps = (from_pos.index() - to_pos.index()) as usize;
            if steps > 1 {
                return Err(MigrateError::MultiStepDowngrade {
                    from: from.to_string(),
                    to: to.to_string(),
                    steps,
                });
            }
            let transition = self.transition(Direction::Downgrade, from_pos, to_pos)?;
            (Some(Direction::Downgrade), vec![transition])
        } else {
            (None, Vec::new())
        };

        Ok(MigrationPlan {
            from: from.to_string(),
            to: to.to_string(),
            direction,
            transitions,
        })
    }

    /// Moves the backing store from `from` to `to`, recording each completed
    /// transition in the ledger under `operator`.
    ///
    /// Stops at the first failing action or append; nothing is retried or
    /// compensated.
    pub fn execute(&self, conn: &mut C, from: &str, to: &str, operator: &str) -> Result<MigrationReport> {
        let span = info_span!("migrate.execute", from = %from, to = %to, operator = %operator);
        let _enter = span.enter();

        if operator.trim().is_empty() {
            return Err(MigrateError::validation("no operator identity set"));
        }

        let plan = match self.plan(from, to) {
            Ok(plan) => plan,
            Err(err) => {
                event!(Level::ERROR, error = %err, "migration rejected");
                return Err(err);
            }
        };

        if plan.is_noop() {
            event!(Level::INFO, tag = %to, "nothing to migrate, already at target");
            return Ok(MigrationReport {
                direction: None,
                applied: Vec::new(),
                recorded: Vec::new(),
                current_tag: to.to_string(),
            });
        }

        let mut applied = Vec::with_capacity(plan.transitions.len());
        let mut recorded = Vec::with_capacity(plan.transitions.len());

        for transition in plan.transitions {
            event!(
                Level::INFO,
                direction = %transition.direction,
                from_level = %transition.from_level,
                to_level = %transition.to_level,
                "{} -> {}",
                transition.from_tag,
                transition.to_tag
            );

            let entry = self.apply(conn, &transition, operator)?;
            recorded.push(entry);
            applied.push(transition);
        }

        event!(Level::INFO, steps = applied.len(), current = %to, "migration complete");
        Ok(MigrationReport {
            direction: plan.direction,
            applied,
            recorded,
            current_tag: to.to_string(),
        })
    }

    fn apply(&self, conn: &mut C, transition: &Transition, operator: &str) -> Result<LedgerEntry> {
        let step = self
            .registry
            .step_at(Position::At(transition.step_index))
            .ok_or_else(|| MigrateError::NotFound {
                role: "step",
                tag: transition.step_tag().to_string(),
            })?;

        let action = match transition.direction {
            Direction::Upgrade => step.forward(),
            Direction::Downgrade => step.backward(),
        }
        .ok_or_else(|| MigrateError::MissingAction {
            tag: step.tag().to_string(),
            level: step.level().to_string(),
            direction: transition.direction,
        })?;

        if let Err(source) = action(conn) {
            event!(
                Level::ERROR,
                error = %source,
                current = %transition.from_tag,
                "{} error, keeping current state",
                transition.direction
            );
            return Err(MigrateError::Action {
                direction: transition.direction,
                tag: transition.step_tag().to_string(),
                level: transition.step_level().to_string(),
                source,
            });
        }

        self.ledger
            .append(&transition.to_tag, &transition.to_level, operator)
            .map_err(|err| {
                event!(
                    Level::ERROR,
                    error = %err,
                    tag = %transition.step_tag(),
                    "step applied but ledger append failed"
                );
                MigrateError::UnrecordedTransition {
                    tag: transition.step_tag().to_string(),
                    level: transition.step_level().to_string(),
                    source: Box::new(err),
                }
            })
    }

    fn check_claimed_state(&self, from: &str) -> Result<()> {
        let current = self.current_state()?;

        if is_null_tag(from) {
            return match current {
                Some(entry) if !entry.is_null() => {
                    Err(MigrateError::StateConflict { current: entry.tag })
                }
                _ => Ok(()),
            };
        }

        match current {
            None => Err(MigrateError::NoCurrentState),
            Some(entry) if entry.tag != from => Err(MigrateError::StateMismatch {
                claimed: from.to_string(),
                actual: entry.tag,
            }),
            Some(_) => Ok(()),
        }
    }

    fn resolve(&self, tag: &str, role: &'static str) -> Result<Position> {
        self.registry.position(tag).ok_or_else(|| MigrateError::NotFound {
            role,
            tag: tag.to_string(),
        })
    }

    fn transition(&self, direction: Direction, from: Position, to: Position) -> Result<Transition> {
        let step = match direction {
            Direction::Upgrade => to,
            Direction::Downgrade => from,
        };
        let step_index = match step {
            Position::At(i) => i,
            Position::Null => {
                return Err(MigrateError::NotFound {
                    role: "step",
                    tag: self.registry.tag_at(step).to_string(),
                });
            }
        };

        Ok(Transition {
            direction,
            from_tag: self.registry.tag_at(from).to_string(),
            from_level: self.registry.level_at(from).to_string(),
            to_tag: self.registry.tag_at(to).to_string(),
            to_level: self.registry.level_at(to).to_string(),
            step_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::registry::Step;

    type Db = Vec<String>;

    fn registry() -> Registry<Db> {
        let mut registry = Registry::new();
        for (tag, level) in [("a", "mig0001"), ("b", "mig0002"), ("c", "mig0003")] {
            registry
                .register(
                    Step::new(tag)
                        .with_level(level)
                        .with_forward(move |db: &mut Db| {
                            db.push(tag.to_string());
                            Ok(())
                        })
                        .with_backward(move |db: &mut Db| {
                            if db.last().map(String::as_str) == Some(tag) {
                                db.pop();
                            }
                            Ok(())
                        }),
                )
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_plan_upgrade_from_null() {
        let registry = registry();
        let executor = Executor::new(&registry, MemoryLedger::new()).unwrap();

        let plan = executor.plan("null", "c").unwrap();
        assert_eq!(plan.direction, Some(Direction::Upgrade));
        let steps: Vec<_> = plan.transitions.iter().map(|t| t.step_tag()).collect();
        assert_eq!(steps, vec!["a", "b", "c"]);
        assert_eq!(plan.transitions[0].from_tag, "null");
        assert_eq!(plan.transitions[0].from_level, "null");
    }

    #[test]
    fn test_plan_downgrade_to_null() {
        let registry = registry();
        let ledger = MemoryLedger::new();
        ledger.append("a", "mig0001", "alice").unwrap();
        let executor = Executor::new(&registry, &ledger).unwrap();

        let plan = executor.plan("a", "null").unwrap();
        assert_eq!(plan.direction, Some(Direction::Downgrade));
        assert_eq!(plan.transitions.len(), 1);
        assert_eq!(plan.transitions[0].step_tag(), "a");
        assert_eq!(plan.transitions[0].step_level(), "mig0001");
        assert_eq!(plan.transitions[0].to_tag, "null");
        assert_eq!(plan.transitions[0].to_level, "null");
    }

    #[test]
    fn test_plan_does_not_touch_ledger() {
        let registry = registry();
        let ledger = MemoryLedger::new();
        let executor = Executor::new(&registry, &ledger).unwrap();

        executor.plan("null", "b").unwrap();
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn test_empty_registry_is_rejected() {
        let registry: Registry<Db> = Registry::new();
        let executor = Executor::new(&registry, MemoryLedger::new()).unwrap();
        assert!(matches!(
            executor.plan("null", "null"),
            Err(MigrateError::EmptyRegistry)
        ));
    }

    #[test]
    fn test_blank_operator_is_rejected() {
        let registry = registry();
        let ledger = MemoryLedger::new();
        let executor = Executor::new(&registry, &ledger).unwrap();
        let mut db = Db::new();

        let err = executor.execute(&mut db, "null", "a", "  ").unwrap_err();
        assert!(matches!(err, MigrateError::Validation(_)));
        assert!(db.is_empty());
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn test_new_runs_consistency_check() {
        let mut registry: Registry<Db> = Registry::new();
        registry
            .import(vec![Step::new("half").with_level("mig0001").with_forward(|_db: &mut Db| Ok(()))])
            .unwrap();

        let err = Executor::new(&registry, MemoryLedger::new()).unwrap_err();
        assert!(matches!(err, MigrateError::MissingAction { .. }));
    }

    #[test]
    fn test_executor_debug_lists_step_count() {
        let registry = registry();
        let executor = Executor::new(&registry, MemoryLedger::new()).unwrap();

        let rendered = format!("{:?}", executor);
        assert!(rendered.starts_with("Executor"));
        assert!(rendered.contains("steps: 3"));
    }
}
