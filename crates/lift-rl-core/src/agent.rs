//! Linear actor-critic agent trained with one-step TD

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    Dispatch, FeatureVector, LinearCritic, LogisticPolicy, Policy, RLError, Result, Transition,
    ValueFunction,
};

/// Configuration for the actor-critic learner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Actor learning rate
    pub actor_lr: f64,
    /// Critic learning rate
    pub critic_lr: f64,
    /// Discount factor
    pub gamma: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            actor_lr: 0.01,
            critic_lr: 0.01,
            gamma: 0.95,
        }
    }
}

impl AgentConfig {
    /// Reject negative or non-finite rates and discounts outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        for (name, lr) in [("actor_lr", self.actor_lr), ("critic_lr", self.critic_lr)] {
            if !lr.is_finite() || lr < 0.0 {
                return Err(RLError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {lr}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(RLError::InvalidConfig(format!(
                "gamma must lie in [0, 1], got {}",
                self.gamma
            )));
        }
        Ok(())
    }
}

/// What one learning step computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdUpdate {
    /// Critic estimate of the features the action was chosen on
    pub value: f64,
    /// Critic estimate of the post-action features
    pub next_value: f64,
    /// `reward + gamma * next_value - value`
    pub td_error: f64,
    /// Actor's move probability before the update
    pub move_probability: f64,
    /// `action - move_probability`
    pub gradient: f64,
}

/// Agent metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Learning steps taken
    pub updates: u64,
    /// TD error of the most recent step
    pub last_td_error: f64,
    /// Running mean of `|td_error|`
    pub mean_abs_td_error: f64,
}

/// Logistic actor and linear critic sharing one feature vector
///
/// The random source drives both the parameter initialisation and the
/// action sampling; seed it for reproducible runs.
#[derive(Debug, Clone)]
pub struct ActorCritic<R = StdRng> {
    actor: LogisticPolicy,
    critic: LinearCritic,
    config: AgentConfig,
    rng: R,
    metrics: AgentMetrics,
}

impl<R: Rng> ActorCritic<R> {
    /// Create an agent with parameters drawn uniformly from `[0, 1)`
    pub fn new(config: AgentConfig, mut rng: R) -> Result<Self> {
        let actor = LogisticPolicy::random(&mut rng);
        let critic = LinearCritic::random(&mut rng);
        Self::with_parameters(config, actor, critic, rng)
    }

    /// Create an agent from explicit parameters
    pub fn with_parameters(
        config: AgentConfig,
        actor: LogisticPolicy,
        critic: LinearCritic,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            actor = ?actor.params().to_vec(),
            critic = ?critic.weights().to_vec(),
            "initialised actor-critic"
        );
        Ok(Self {
            actor,
            critic,
            config,
            rng,
            metrics: AgentMetrics::default(),
        })
    }

    /// Sample a dispatch decision from the actor
    pub fn act(&mut self, features: &FeatureVector) -> Result<Dispatch> {
        self.actor.act(features, &mut self.rng)
    }

    /// Critic estimate for `features`
    #[must_use]
    pub fn value(&self, features: &FeatureVector) -> f64 {
        self.critic.value(features)
    }

    /// One TD(0) step on both the critic and the actor
    pub fn learn(&mut self, transition: &Transition) -> TdUpdate {
        let value = self.critic.value(&transition.features);
        let next_value = self.critic.value(&transition.next_features);
        let td_error = transition.reward.value() + self.config.gamma * next_value - value;

        // Both gradients are taken at the pre-update parameters.
        let move_probability = self.actor.move_probability(&transition.features);
        let gradient = transition.action.as_f64() - move_probability;

        self.critic
            .step(self.config.critic_lr * td_error, &transition.features);
        self.actor
            .step(self.config.actor_lr * td_error * gradient, &transition.features);

        self.metrics.updates += 1;
        self.metrics.last_td_error = td_error;
        #[allow(clippy::cast_precision_loss)]
        let n = self.metrics.updates as f64;
        self.metrics.mean_abs_td_error += (td_error.abs() - self.metrics.mean_abs_td_error) / n;

        tracing::trace!(td_error, value, next_value, gradient, "td update");

        TdUpdate {
            value,
            next_value,
            td_error,
            move_probability,
            gradient,
        }
    }

    /// The actor
    #[must_use]
    pub fn actor(&self) -> &LogisticPolicy {
        &self.actor
    }

    /// The critic
    #[must_use]
    pub fn critic(&self) -> &LinearCritic {
        &self.critic
    }

    /// Learner configuration
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Get agent metrics
    #[must_use]
    pub fn metrics(&self) -> AgentMetrics {
        self.metrics.clone()
    }
}
