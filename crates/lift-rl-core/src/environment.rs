//! Environment traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Reward;

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step<O, S> {
    /// Observation after the action, before the next call arrives
    pub observation: O,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode is done
    pub done: bool,
    /// Whether the episode was truncated (e.g., time limit)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
    /// Internal state the step was taken in (if available)
    pub state: Option<S>,
}

/// Additional information from a step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl StepInfo {
    /// Attach a serializable field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) -> crate::Result<()> {
        self.fields.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Read a field back as `f64`
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(serde_json::Value::as_f64)
    }
}

/// Record of a run (the dispatch task never terminates on its own)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Episode ID
    pub id: String,
    /// Total reward
    pub total_reward: f64,
    /// Number of steps
    pub steps: usize,
    /// Whether episode was truncated
    pub truncated: bool,
    /// Start time
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// End time
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Core environment trait
#[async_trait]
pub trait Environment: Send + Sync {
    /// Observation type
    type Observation: Clone + Send + Sync;
    /// Action type
    type Action: Send + Sync;
    /// State type
    type State: Clone + Send + Sync;

    /// Reset the environment and return the first observation
    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)>;

    /// Observation the next action should be chosen on
    fn observation(&self) -> Self::Observation;

    /// Take a step in the environment
    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation, Self::State>>;

    /// Close the environment
    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }

    /// Get current episode info
    fn episode_info(&self) -> Option<Episode> {
        None
    }
}

/// Wrapper for environments that tracks episodes
pub struct TrackedEnvironment<E> {
    /// Inner environment
    pub env: E,
    /// Current episode
    pub episode: Option<Episode>,
    /// Step counter
    pub step_count: usize,
}

impl<E> TrackedEnvironment<E> {
    /// Create a new tracked environment
    pub fn new(env: E) -> Self {
        Self {
            env,
            episode: None,
            step_count: 0,
        }
    }
}

#[async_trait]
impl<E> Environment for TrackedEnvironment<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;
    type State = E::State;

    async fn reset(&mut self) -> crate::Result<(Self::Observation, StepInfo)> {
        if let Some(ref mut episode) = self.episode {
            episode.end_time = Some(chrono::Utc::now());
        }

        let id = uuid::Uuid::new_v4().to_string();
        tracing::info!(episode = %id, "starting episode");
        self.episode = Some(Episode {
            id,
            total_reward: 0.0,
            steps: 0,
            truncated: false,
            start_time: chrono::Utc::now(),
            end_time: None,
        });
        self.step_count = 0;

        self.env.reset().await
    }

    fn observation(&self) -> Self::Observation {
        self.env.observation()
    }

    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::Observation, Self::State>> {
        let step = self.env.step(action).await?;

        self.step_count += 1;
        if let Some(ref mut episode) = self.episode {
            episode.total_reward += step.reward.0;
            episode.steps = self.step_count;

            if step.done || step.truncated {
                episode.truncated = step.truncated;
                episode.end_time = Some(chrono::Utc::now());
            }
        }

        Ok(step)
    }

    async fn close(&mut self) -> crate::Result<()> {
        if let Some(ref mut episode) = self.episode {
            if episode.end_time.is_none() {
                episode.end_time = Some(chrono::Utc::now());
            }
        }
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.episode.clone()
    }
}
