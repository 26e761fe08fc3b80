//! Elevator state and the building it lives in

use serde::{Deserialize, Serialize};

use crate::{RLError, Result};

/// Static description of the building served by the car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Building {
    /// Highest floor index; floors are numbered `0..=max_floor`
    pub max_floor: u32,
    /// Passenger counts are drawn from `0..capacity`
    pub capacity: u32,
}

impl Default for Building {
    fn default() -> Self {
        Self {
            max_floor: 10,
            capacity: 8,
        }
    }
}

impl Building {
    /// Reject buildings with an empty floor range or no room for passengers
    pub fn validate(&self) -> Result<()> {
        if self.max_floor == 0 {
            return Err(RLError::InvalidConfig(
                "max_floor must be at least 1 (empty floor range)".into(),
            ));
        }
        if self.capacity == 0 {
            return Err(RLError::InvalidConfig("capacity must be at least 1".into()));
        }
        Ok(())
    }

    /// Whether `floor` is a valid floor index
    #[must_use]
    pub fn contains_floor(&self, floor: u32) -> bool {
        floor <= self.max_floor
    }

    /// Number of drawable floor levels, ground floor included
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.max_floor + 1
    }
}

/// Mutable part of the simulation: where the car is and what it was asked to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevatorState {
    /// Floor the car is standing at
    pub current_floor: u32,
    /// Floor of the pending call
    pub target_floor: u32,
    /// Passengers waiting on the pending call
    pub passengers: u32,
}

impl ElevatorState {
    /// Create a state, checking every field against the building
    pub fn new(
        building: &Building,
        current_floor: u32,
        target_floor: u32,
        passengers: u32,
    ) -> Result<Self> {
        let state = Self {
            current_floor,
            target_floor,
            passengers,
        };
        state.check(building)?;
        Ok(state)
    }

    /// Verify the floor and passenger invariants
    pub fn check(&self, building: &Building) -> Result<()> {
        if !building.contains_floor(self.current_floor) {
            return Err(RLError::InvalidState(format!(
                "current floor {} outside 0..={}",
                self.current_floor, building.max_floor
            )));
        }
        if !building.contains_floor(self.target_floor) {
            return Err(RLError::InvalidState(format!(
                "target floor {} outside 0..={}",
                self.target_floor, building.max_floor
            )));
        }
        if self.passengers >= building.capacity {
            return Err(RLError::InvalidState(format!(
                "passenger count {} outside 0..{}",
                self.passengers, building.capacity
            )));
        }
        Ok(())
    }

    /// Floors between the car and the call
    #[must_use]
    pub fn distance(&self) -> u32 {
        self.current_floor.abs_diff(self.target_floor)
    }

    /// Whether the car already stands at the call floor
    #[must_use]
    pub fn at_target(&self) -> bool {
        self.current_floor == self.target_floor
    }

    /// Snap the car to the call floor
    pub fn serve(&mut self) {
        self.current_floor = self.target_floor;
    }
}
