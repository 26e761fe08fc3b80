//! Linear actor-critic core for a single simulated elevator
//!
//! A logistic policy decides, call by call, whether to send the car to the
//! requested floor. A linear critic over the same four features supplies the
//! one-step TD error that trains both of them online.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod environment;
pub mod error;
pub mod features;
pub mod policy;
pub mod reward;
pub mod state;
pub mod trajectory;
pub mod value;

// Re-export core traits and types
pub use action::Dispatch;
pub use agent::{ActorCritic, AgentConfig, AgentMetrics, TdUpdate};
pub use environment::{Environment, Episode, Step, StepInfo, TrackedEnvironment};
pub use error::{RLError, Result};
pub use features::{FeatureExtractor, FeatureScales, FeatureVector, FEATURE_DIM};
pub use policy::{sigmoid, LogisticPolicy, Policy, StochasticPolicy};
pub use reward::{CostModel, DispatchReward, Reward, RewardFunction, TripCost};
pub use state::{Building, ElevatorState};
pub use trajectory::Transition;
pub use value::{LinearCritic, ValueFunction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ActorCritic, AgentConfig, Dispatch, ElevatorState, Environment, FeatureVector, Result,
        Reward, Step, Transition,
    };
}
