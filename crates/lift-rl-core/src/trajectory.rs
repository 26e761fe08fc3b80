//! Transitions handed to the learner

use serde::{Deserialize, Serialize};

use crate::{Dispatch, FeatureVector, Reward};

/// One dispatch decision and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Features the action was chosen on
    pub features: FeatureVector,
    /// Action taken
    pub action: Dispatch,
    /// Reward received
    pub reward: Reward,
    /// Features after the action, same call
    pub next_features: FeatureVector,
}

impl Transition {
    /// Bundle a transition
    #[must_use]
    pub fn new(
        features: FeatureVector,
        action: Dispatch,
        reward: Reward,
        next_features: FeatureVector,
    ) -> Self {
        Self {
            features,
            action,
            reward,
            next_features,
        }
    }
}
