use serde::{Deserialize, Serialize};
use std::fmt;

/// Worker lifecycle states, in the only order the platform may report them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Initial state when a candidate is discovered
    Installing,
    /// Install finished; waiting to activate
    Installed,
    /// Activation in progress
    Activating,
    /// Worker is active for the registration
    Activated,
    /// Worker was discarded (failed or superseded)
    Redundant,
}

impl WorkerState {
    /// All states in protocol order
    pub const ORDER: [WorkerState; 5] = [
        Self::Installing,
        Self::Installed,
        Self::Activating,
        Self::Activated,
        Self::Redundant,
    ];

    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redundant)
    }

    /// Check if the candidate is still on its way to activation
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Installing | Self::Installed | Self::Activating)
    }

    /// Position in the protocol order, zero-based
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Installing => 0,
            Self::Installed => 1,
            Self::Activating => 2,
            Self::Activated => 3,
            Self::Redundant => 4,
        }
    }

    /// The state that normally follows this one, if any
    pub fn next(&self) -> Option<WorkerState> {
        Self::ORDER.get(self.ordinal() + 1).copied()
    }

    /// Whether `to` is a legal successor of `self`.
    ///
    /// Only the immediate successor is legal, except that `Redundant` may be
    /// entered from any non-terminal state.
    pub fn can_transition_to(&self, to: WorkerState) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Redundant || self.next() == Some(to)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

impl std::str::FromStr for WorkerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installing" => Ok(Self::Installing),
            "installed" => Ok(Self::Installed),
            "activating" => Ok(Self::Activating),
            "activated" => Ok(Self::Activated),
            "redundant" => Ok(Self::Redundant),
            _ => Err(format!("Invalid worker state: {s}")),
        }
    }
}

/// Default state for newly discovered candidates
impl Default for WorkerState {
    fn default() -> Self {
        Self::Installing
    }
}
