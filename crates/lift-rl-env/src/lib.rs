//! Elevator dispatch environment
//!
//! One car, one pending call at a time, a binary go/stay decision per call.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod elevator;
pub mod wrappers;

pub use elevator::{Call, ElevatorEnv, ElevatorEnvConfig, ScenarioGenerator};
pub use wrappers::TimeLimit;

// Re-export core types
pub use lift_rl_core::{Environment, Episode, Step, StepInfo, TrackedEnvironment};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{ElevatorEnv, ElevatorEnvConfig, TimeLimit};
    pub use lift_rl_core::prelude::*;
}
