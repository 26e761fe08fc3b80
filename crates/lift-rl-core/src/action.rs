//! Dispatch actions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary dispatch decision taken once per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    /// Leave the car where it is (action 0)
    Stay,
    /// Send the car to the call floor (action 1)
    Move,
}

impl Dispatch {
    /// Numeric encoding used by the policy gradient: 0 for stay, 1 for move
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Stay => 0.0,
            Self::Move => 1.0,
        }
    }

    /// Whether this action moves the car
    #[must_use]
    pub fn is_move(self) -> bool {
        matches!(self, Self::Move)
    }
}

impl From<bool> for Dispatch {
    fn from(go: bool) -> Self {
        if go {
            Self::Move
        } else {
            Self::Stay
        }
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stay => write!(f, "stay"),
            Self::Move => write!(f, "move"),
        }
    }
}
