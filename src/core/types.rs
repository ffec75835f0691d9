use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved tag (and level) of the pristine, pre-migration state.
pub const NULL_TAG: &str = "null";

/// Direction of a walk along the ordered step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Upgrade,
    Downgrade,
}

impl Direction {
    /// Name of the action a step runs when walked in this direction.
    pub const fn action_name(self) -> &'static str {
        match self {
            Self::Upgrade => "forward",
            Self::Downgrade => "backward",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upgrade => write!(f, "UPGRADE"),
            Self::Downgrade => write!(f, "DOWNGRADE"),
        }
    }
}

/// A position on the linear track: the virtual null step or a registry index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Null,
    At(usize),
}

impl Position {
    /// Signed index, `-1` for the null position.
    pub fn index(self) -> isize {
        match self {
            Self::Null => -1,
            Self::At(i) => i as isize,
        }
    }

    /// Position following this one.
    pub fn next(self) -> Self {
        match self {
            Self::Null => Self::At(0),
            Self::At(i) => Self::At(i + 1),
        }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index().cmp(&other.index())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_precedes_every_index() {
        assert_eq!(Position::Null.index(), -1);
        assert!(Position::Null < Position::At(0));
        assert!(Position::At(0) < Position::At(3));
        assert_eq!(Position::Null.next(), Position::At(0));
    }
}
