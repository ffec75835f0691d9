use thiserror::Error;

use super::types::Direction;

/// Boxed cause returned by a step's forward or backward action.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Step '{tag}' ({level}) has no {} action", direction.action_name())]
    MissingAction {
        tag: String,
        level: String,
        direction: Direction,
    },

    #[error("{role}: couldn't find tag '{tag}'")]
    NotFound { role: &'static str, tag: String },

    #[error("No migration step registered")]
    EmptyRegistry,

    #[error("Current state is not available (ledger has no entries)")]
    NoCurrentState,

    #[error("There is a current state available ('{current}'), cannot claim null")]
    StateConflict { current: String },

    #[error("From-tag '{claimed}' not equal to ledger state '{actual}'")]
    StateMismatch { claimed: String, actual: String },

    #[error("Can't downgrade more than one step ({from} -> {to} spans {steps} steps)")]
    MultiStepDowngrade {
        from: String,
        to: String,
        steps: usize,
    },

    #[error("{direction} failed at target state: {tag} ({level}): {source}")]
    Action {
        direction: Direction,
        tag: String,
        level: String,
        #[source]
        source: BoxError,
    },

    #[error("Step '{tag}' ({level}) was applied but could not be recorded: {source}")]
    UnrecordedTransition {
        tag: String,
        level: String,
        #[source]
        source: Box<MigrateError>,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Ledger has no entries")]
    EmptyLedger,

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, MigrateError>;

impl MigrateError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Returns the step tag this error is attributed to, if any.
    pub fn step_tag(&self) -> Option<&str> {
        match self {
            Self::MissingAction { tag, .. }
            | Self::Action { tag, .. }
            | Self::UnrecordedTransition { tag, .. } => Some(tag),
            _ => None,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for MigrateError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_names_step_and_cause() {
        let err = MigrateError::Action {
            direction: Direction::Upgrade,
            tag: "user_table_add_column".to_string(),
            level: "mig0002.rs".to_string(),
            source: "fake error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("user_table_add_column"));
        assert!(msg.contains("mig0002.rs"));
        assert!(msg.contains("fake error"));
        assert_eq!(err.step_tag(), Some("user_table_add_column"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_not_found_carries_role() {
        let err = MigrateError::NotFound {
            role: "to-code",
            tag: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "to-code: couldn't find tag 'ghost'");
        assert!(err.step_tag().is_none());
    }
}
