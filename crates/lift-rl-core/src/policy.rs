//! Policy abstractions and the linear-logistic dispatch actor

use ndarray::Array1;
use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;

use crate::{Dispatch, FeatureVector, RLError, Result, FEATURE_DIM};

/// Logistic function, evaluated so that `exp` never overflows
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Core policy trait for selecting actions
///
/// The random source is passed in so seeded runs are reproducible.
pub trait Policy: Send + Sync {
    /// Observation type
    type Observation;
    /// Action type
    type Action;

    /// Select an action given an observation
    fn act<R: Rng + ?Sized>(&self, observation: &Self::Observation, rng: &mut R)
        -> Result<Self::Action>;
}

/// Stochastic policy that exposes its action distribution
pub trait StochasticPolicy: Policy {
    /// Probability of taking `action` under `observation`
    fn probability(&self, observation: &Self::Observation, action: &Self::Action) -> f64;
}

/// Linear-logistic policy: `P(move) = sigmoid(theta . features)`
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticPolicy {
    params: Array1<f64>,
}

impl LogisticPolicy {
    /// Create a policy from explicit parameters
    pub fn new(params: Array1<f64>) -> Result<Self> {
        if params.len() != FEATURE_DIM {
            return Err(RLError::DimensionMismatch {
                expected: FEATURE_DIM,
                actual: params.len(),
            });
        }
        Ok(Self { params })
    }

    /// Parameters drawn uniformly from `[0, 1)`
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            params: (0..FEATURE_DIM).map(|_| rng.gen::<f64>()).collect(),
        }
    }

    /// Current parameters
    #[must_use]
    pub fn params(&self) -> &Array1<f64> {
        &self.params
    }

    /// Linear score `theta . features`
    #[must_use]
    pub fn score(&self, features: &FeatureVector) -> f64 {
        features.dot(&self.params)
    }

    /// Probability of sending the car
    #[must_use]
    pub fn move_probability(&self, features: &FeatureVector) -> f64 {
        sigmoid(self.score(features))
    }

    /// `action - P(move)`, the score-function gradient factor of the log-policy
    #[must_use]
    pub fn gradient(&self, features: &FeatureVector, action: Dispatch) -> f64 {
        action.as_f64() - self.move_probability(features)
    }

    /// `theta += step * features`
    pub fn step(&mut self, step: f64, features: &FeatureVector) {
        self.params.scaled_add(step, features.as_array());
    }
}

impl Policy for LogisticPolicy {
    type Observation = FeatureVector;
    type Action = Dispatch;

    fn act<R: Rng + ?Sized>(&self, features: &FeatureVector, rng: &mut R) -> Result<Dispatch> {
        let p = self.move_probability(features);
        let coin = Bernoulli::new(p)
            .map_err(|e| RLError::Computation(format!("move probability {p}: {e}")))?;
        Ok(Dispatch::from(coin.sample(rng)))
    }
}

impl StochasticPolicy for LogisticPolicy {
    fn probability(&self, features: &FeatureVector, action: &Dispatch) -> f64 {
        let p = self.move_probability(features);
        match action {
            Dispatch::Move => p,
            Dispatch::Stay => 1.0 - p,
        }
    }
}
