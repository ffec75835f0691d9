use crate::core::Direction;
use crate::ledger::LedgerEntry;

/// One move between adjacent positions on the track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub direction: Direction,
    pub from_tag: String,
    pub from_level: String,
    /// State recorded in the ledger once the action succeeds
    pub to_tag: String,
    pub to_level: String,
    pub(crate) step_index: usize,
}

impl Transition {
    /// Tag of the step whose action runs: the target when upgrading, the
    /// source when downgrading.
    pub fn step_tag(&self) -> &str {
        match self.direction {
            Direction::Upgrade => &self.to_tag,
            Direction::Downgrade => &self.from_tag,
        }
    }

    pub fn step_level(&self) -> &str {
        match self.direction {
            Direction::Upgrade => &self.to_level,
            Direction::Downgrade => &self.from_level,
        }
    }
}

/// Resolved walk from a claimed state to a target, not yet executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub from: String,
    pub to: String,
    /// `None` when already at the target
    pub direction: Option<Direction>,
    pub transitions: Vec<Transition>,
}

impl MigrationPlan {
    pub fn is_noop(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Outcome of a successful execution.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub direction: Option<Direction>,
    pub applied: Vec<Transition>,
    /// Ledger entries appended by this run, oldest first
    pub recorded: Vec<LedgerEntry>,
    pub current_tag: String,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}
