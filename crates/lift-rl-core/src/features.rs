//! Feature extraction shared by the actor and the critic

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{Building, CostModel, ElevatorState, RLError, Result};

/// Number of features: distance, passengers, energy, wait
pub const FEATURE_DIM: usize = 4;

/// Divisors that bring the raw quantities into a comparable range
///
/// Distance is always normalized by the building's `max_floor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureScales {
    /// Divisor for the passenger count
    pub passengers: f64,
    /// Divisor for the energy estimate
    pub energy: f64,
    /// Divisor for the wait estimate
    pub wait: f64,
}

impl Default for FeatureScales {
    fn default() -> Self {
        Self {
            passengers: 8.0,
            energy: 10.0,
            wait: 30.0,
        }
    }
}

impl FeatureScales {
    /// Reject zero, negative or non-finite divisors
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("passengers", self.passengers),
            ("energy", self.energy),
            ("wait", self.wait),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(RLError::InvalidConfig(format!(
                    "feature scale `{name}` must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Fixed-length state summary fed to the actor and the critic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Array1<f64>);

impl FeatureVector {
    /// Wrap an array, checking its length
    pub fn new(values: Array1<f64>) -> Result<Self> {
        if values.len() != FEATURE_DIM {
            return Err(RLError::DimensionMismatch {
                expected: FEATURE_DIM,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }

    /// Build from a fixed-size array
    #[must_use]
    pub fn from_array(values: [f64; FEATURE_DIM]) -> Self {
        Self(Array1::from_vec(values.to_vec()))
    }

    /// All-zero features (car already at the call floor, nobody waiting)
    #[must_use]
    pub fn zeros() -> Self {
        Self(Array1::zeros(FEATURE_DIM))
    }

    /// Underlying array
    #[must_use]
    pub fn as_array(&self) -> &Array1<f64> {
        &self.0
    }

    /// Copy of the values as a plain vector
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    /// Inner product with a parameter vector of the same length
    #[must_use]
    pub fn dot(&self, params: &Array1<f64>) -> f64 {
        params.dot(&self.0)
    }
}

/// Maps an [`ElevatorState`] to its [`FeatureVector`]
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    building: Building,
    costs: CostModel,
    scales: FeatureScales,
}

impl FeatureExtractor {
    /// Create an extractor, validating every divisor
    pub fn new(building: Building, costs: CostModel, scales: FeatureScales) -> Result<Self> {
        building.validate()?;
        costs.validate()?;
        scales.validate()?;
        Ok(Self {
            building,
            costs,
            scales,
        })
    }

    /// Cost model the energy and wait features are taken from
    #[must_use]
    pub fn costs(&self) -> &CostModel {
        &self.costs
    }

    /// `[distance/max_floor, passengers/8, energy/10, wait/30]` with the default scales
    #[must_use]
    pub fn extract(&self, state: &ElevatorState) -> FeatureVector {
        let trip = self.costs.trip(state);
        FeatureVector::from_array([
            trip.distance / f64::from(self.building.max_floor),
            f64::from(state.passengers) / self.scales.passengers,
            trip.energy / self.scales.energy,
            trip.wait / self.scales.wait,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(
            Building::default(),
            CostModel::default(),
            FeatureScales::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_extract_known_state() {
        let state = ElevatorState {
            current_floor: 0,
            target_floor: 5,
            passengers: 4,
        };
        let f = extractor().extract(&state).to_vec();

        assert_relative_eq!(f[0], 0.5);
        assert_relative_eq!(f[1], 0.5);
        // energy = 5 * (0.1 + 0.08) = 0.9
        assert_relative_eq!(f[2], 0.09, epsilon = 1e-12);
        assert_relative_eq!(f[3], 10.0 / 30.0, epsilon = 1e-12);
    }

    #[test]
    fn test_at_target_distance_terms_vanish() {
        let state = ElevatorState {
            current_floor: 3,
            target_floor: 3,
            passengers: 0,
        };
        assert_eq!(extractor().extract(&state), FeatureVector::zeros());
    }

    #[test]
    fn test_extract_is_idempotent() {
        let ex = extractor();
        let state = ElevatorState {
            current_floor: 8,
            target_floor: 1,
            passengers: 6,
        };
        let first = ex.extract(&state);
        let second = ex.extract(&state);
        assert_eq!(first, second);
        assert_eq!(state.current_floor, 8);
    }

    #[test]
    fn test_dimension_check() {
        assert!(FeatureVector::new(Array1::zeros(3)).is_err());
        assert!(FeatureVector::new(Array1::zeros(FEATURE_DIM)).is_ok());
    }

    #[test]
    fn test_rejects_zero_scale() {
        let scales = FeatureScales {
            wait: 0.0,
            ..FeatureScales::default()
        };
        assert!(FeatureExtractor::new(Building::default(), CostModel::default(), scales).is_err());
    }
}
