//! Step registry: collects declarations, validates them and keeps them
//! ordered by level.

mod step;

pub use step::{RegisteredStep, Step, StepAction};

use std::collections::HashSet;
use std::panic::Location;
use std::path::Path;

use crate::core::{Direction, MigrateError, NULL_TAG, Position, Result, is_null_tag, validate_tag};

/// Ordered set of migration steps.
///
/// The registry is populated once at start-up and treated as read-only
/// afterwards; the executor only borrows it.
pub struct Registry<C> {
    steps: Vec<RegisteredStep<C>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.steps.iter()).finish()
    }
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Registers a step and re-sorts the sequence by level.
    ///
    /// Fails with a validation error, leaving the registry untouched, if the
    /// tag is empty, reserved, contains whitespace or is already taken, or if
    /// either action is missing. A step declared without a level gets the file
    /// name of the calling source file.
    #[track_caller]
    pub fn register(&mut self, step: Step<C>) -> Result<()> {
        let caller = caller_file(Location::caller());

        validate_tag(&step.tag)?;
        if self.contains(&step.tag) {
            return Err(MigrateError::validation(format!(
                "tag '{}' already exists ({})",
                step.tag, caller
            )));
        }
        if step.forward.is_none() {
            return Err(MigrateError::validation(format!(
                "forward action missing for '{}' ({})",
                step.tag, caller
            )));
        }
        if step.backward.is_none() {
            return Err(MigrateError::validation(format!(
                "backward action missing for '{}' ({})",
                step.tag, caller
            )));
        }

        let level = step.level.clone().unwrap_or(caller);
        self.steps.push(RegisteredStep::from_step(step, level));
        self.sort();
        Ok(())
    }

    /// Fluent variant of [`register`](Self::register).
    #[track_caller]
    pub fn with_step(mut self, step: Step<C>) -> Result<Self> {
        self.register(step)?;
        Ok(self)
    }

    /// Imports a batch of declarations, e.g. assembled from an external file
    /// list.
    ///
    /// Tag rules and uniqueness are enforced for the whole batch before
    /// anything is inserted, but missing actions are not: run
    /// [`consistency_check`](Self::consistency_check) before executing.
    #[track_caller]
    pub fn import<I>(&mut self, steps: I) -> Result<()>
    where
        I: IntoIterator<Item = Step<C>>,
    {
        let caller = caller_file(Location::caller());
        let batch: Vec<Step<C>> = steps.into_iter().collect();

        let mut seen: HashSet<&str> = self.steps.iter().map(|s| s.tag()).collect();
        for step in &batch {
            validate_tag(&step.tag)?;
            if !seen.insert(step.tag.as_str()) {
                return Err(MigrateError::validation(format!(
                    "tag '{}' already exists ({})",
                    step.tag, caller
                )));
            }
        }

        for step in batch {
            let level = step.level.clone().unwrap_or_else(|| caller.clone());
            self.steps.push(RegisteredStep::from_step(step, level));
        }
        self.sort();
        Ok(())
    }

    /// Verifies that every step carries both actions.
    pub fn consistency_check(&self) -> Result<()> {
        for step in &self.steps {
            if step.forward().is_none() {
                return Err(MigrateError::MissingAction {
                    tag: step.tag().to_string(),
                    level: step.level().to_string(),
                    direction: Direction::Upgrade,
                });
            }
            if step.backward().is_none() {
                return Err(MigrateError::MissingAction {
                    tag: step.tag().to_string(),
                    level: step.level().to_string(),
                    direction: Direction::Downgrade,
                });
            }
        }
        Ok(())
    }

    /// Resolves a tag to its position; `"null"` is [`Position::Null`].
    pub fn index_of(&self, tag: &str) -> Result<Position> {
        self.position(tag).ok_or_else(|| MigrateError::NotFound {
            role: "tag",
            tag: tag.to_string(),
        })
    }

    pub(crate) fn position(&self, tag: &str) -> Option<Position> {
        if is_null_tag(tag) {
            return Some(Position::Null);
        }
        self.steps
            .iter()
            .position(|s| s.tag() == tag)
            .map(Position::At)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.steps.iter().any(|s| s.tag() == tag)
    }

    pub fn get(&self, tag: &str) -> Option<&RegisteredStep<C>> {
        self.steps.iter().find(|s| s.tag() == tag)
    }

    /// Step at a position, `None` for null or out of range.
    pub fn step_at(&self, position: Position) -> Option<&RegisteredStep<C>> {
        match position {
            Position::Null => None,
            Position::At(i) => self.steps.get(i),
        }
    }

    /// Tag at a position; the null position renders as `"null"`.
    pub fn tag_at(&self, position: Position) -> &str {
        self.step_at(position).map_or(NULL_TAG, |s| s.tag())
    }

    /// Level at a position; the null position renders as `"null"`.
    pub fn level_at(&self, position: Position) -> &str {
        self.step_at(position).map_or(NULL_TAG, |s| s.level())
    }

    pub fn steps(&self) -> &[RegisteredStep<C>] {
        &self.steps
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.tag())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn sort(&mut self) {
        self.steps.sort_by(|a, b| a.level().cmp(b.level()));
    }
}

fn caller_file(location: &Location<'_>) -> String {
    Path::new(location.file())
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(location.file())
        .to_string()
}
