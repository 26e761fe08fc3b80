//! Value functions for the critic

use ndarray::Array1;
use rand::Rng;

use crate::{FeatureVector, RLError, Result, FEATURE_DIM};

/// State value function V(s)
pub trait ValueFunction: Send + Sync {
    /// Observation type
    type Observation;

    /// Estimate the value of an observation
    fn value(&self, observation: &Self::Observation) -> f64;
}

/// Linear value function `V(s) = w . features`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCritic {
    weights: Array1<f64>,
}

impl LinearCritic {
    /// Create a critic from explicit weights
    pub fn new(weights: Array1<f64>) -> Result<Self> {
        if weights.len() != FEATURE_DIM {
            return Err(RLError::DimensionMismatch {
                expected: FEATURE_DIM,
                actual: weights.len(),
            });
        }
        Ok(Self { weights })
    }

    /// Weights drawn uniformly from `[0, 1)`
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            weights: (0..FEATURE_DIM).map(|_| rng.gen::<f64>()).collect(),
        }
    }

    /// Current weights
    #[must_use]
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// `w += step * features`
    pub fn step(&mut self, step: f64, features: &FeatureVector) {
        self.weights.scaled_add(step, features.as_array());
    }
}

impl ValueFunction for LinearCritic {
    type Observation = FeatureVector;

    fn value(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn test_value_is_dot_product() {
        let critic = LinearCritic::new(arr1(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        let features = FeatureVector::from_array([0.5, 0.25, 0.1, 0.2]);
        assert_relative_eq!(critic.value(&features), 0.5 + 0.5 + 0.3 + 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_value_is_deterministic() {
        let critic = LinearCritic::new(arr1(&[0.11, 0.42, 0.93, 0.37])).unwrap();
        let features = FeatureVector::from_array([0.7, 0.375, 0.126, 0.467]);
        let first = critic.value(&features);
        assert_eq!(critic.value(&features), first);
        assert_eq!(critic.clone().value(&features), first);
    }

    #[test]
    fn test_step_moves_along_features() {
        let mut critic = LinearCritic::new(Array1::zeros(FEATURE_DIM)).unwrap();
        critic.step(0.5, &FeatureVector::from_array([1.0, 0.0, 2.0, 0.0]));
        assert_eq!(critic.weights(), &arr1(&[0.5, 0.0, 1.0, 0.0]));
    }
}
