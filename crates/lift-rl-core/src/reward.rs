//! Reward signals and the shared trip cost model
//!
//! The same energy and wait estimates feed both the reward and the feature
//! vector, so they are computed in exactly one place: [`CostModel::trip`].

use serde::{Deserialize, Serialize};

use crate::{Dispatch, ElevatorState, RLError, Result};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Reward(pub f64);

impl Reward {
    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Cost estimate of serving one call from the car's current floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripCost {
    /// Floors to travel
    pub distance: f64,
    /// Energy estimate for the trip
    pub energy: f64,
    /// Wait-time estimate for the trip
    pub wait: f64,
}

/// Coefficients of the trip cost and of the reward built from it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Energy per floor with an empty car
    pub energy_base: f64,
    /// Extra energy per floor for each passenger
    pub energy_per_passenger: f64,
    /// Wait time per floor travelled
    pub wait_per_floor: f64,
    /// Weight of the energy term in the reward
    pub energy_weight: f64,
    /// Weight of the wait term in the reward
    pub wait_weight: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            energy_base: 0.1,
            energy_per_passenger: 0.02,
            wait_per_floor: 2.0,
            energy_weight: 0.3,
            wait_weight: 0.7,
        }
    }
}

impl CostModel {
    /// Reject negative or non-finite coefficients
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("energy_base", self.energy_base),
            ("energy_per_passenger", self.energy_per_passenger),
            ("wait_per_floor", self.wait_per_floor),
            ("energy_weight", self.energy_weight),
            ("wait_weight", self.wait_weight),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(RLError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Distance, energy and wait for the state's pending call
    #[must_use]
    pub fn trip(&self, state: &ElevatorState) -> TripCost {
        let distance = f64::from(state.distance());
        let passengers = f64::from(state.passengers);
        TripCost {
            distance,
            energy: distance * (self.energy_base + self.energy_per_passenger * passengers),
            wait: distance * self.wait_per_floor,
        }
    }

    /// Negative weighted cost of a trip
    #[must_use]
    pub fn reward(&self, cost: &TripCost) -> Reward {
        Reward(-(self.energy_weight * cost.energy + self.wait_weight * cost.wait))
    }
}

/// Trait for reward functions
pub trait RewardFunction: Send + Sync {
    /// State type
    type State;
    /// Action type
    type Action;

    /// Compute reward for a state-action-next_state transition
    fn reward(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State)
        -> Reward;
}

/// Dispatch reward: the cost of the call as seen before the car moves
///
/// The action and the post-move state do not enter the reward; staying put
/// is charged the same as moving.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchReward {
    /// Cost coefficients
    pub costs: CostModel,
}

impl DispatchReward {
    /// Create a dispatch reward over the given cost model
    #[must_use]
    pub fn new(costs: CostModel) -> Self {
        Self { costs }
    }
}

impl RewardFunction for DispatchReward {
    type State = ElevatorState;
    type Action = Dispatch;

    fn reward(&self, state: &ElevatorState, _action: &Dispatch, _next: &ElevatorState) -> Reward {
        self.costs.reward(&self.costs.trip(state))
    }
}
