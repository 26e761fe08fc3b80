//! Environment wrappers

use async_trait::async_trait;

use lift_rl_core::{Environment, Episode, Step, StepInfo};

/// Time limit wrapper
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }
}

#[async_trait]
impl<E> Environment for TimeLimit<E>
where
    E: Environment,
{
    type Observation = E::Observation;
    type Action = E::Action;
    type State = E::State;

    async fn reset(&mut self) -> lift_rl_core::Result<(Self::Observation, StepInfo)> {
        self.steps = 0;
        self.env.reset().await
    }

    fn observation(&self) -> Self::Observation {
        self.env.observation()
    }

    async fn step(&mut self, action: Self::Action) -> lift_rl_core::Result<Step<Self::Observation, Self::State>> {
        self.steps += 1;
        let mut step = self.env.step(action).await?;

        if self.steps >= self.max_steps && !step.done {
            tracing::debug!(max_steps = self.max_steps, "time limit reached");
            step.truncated = true;
            step.done = true;
        }

        Ok(step)
    }

    async fn close(&mut self) -> lift_rl_core::Result<()> {
        self.env.close().await
    }

    fn episode_info(&self) -> Option<Episode> {
        self.env.episode_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElevatorEnv, ElevatorEnvConfig};
    use lift_rl_core::Dispatch;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[tokio::test]
    async fn test_time_limit_truncates() {
        let env = ElevatorEnv::new(ElevatorEnvConfig::default(), StdRng::seed_from_u64(0)).unwrap();
        let mut env = TimeLimit::new(env, 3);
        env.reset().await.unwrap();

        for _ in 0..2 {
            let step = env.step(Dispatch::Stay).await.unwrap();
            assert!(!step.truncated);
        }
        let last = env.step(Dispatch::Move).await.unwrap();
        assert!(last.truncated);
        assert!(last.done);
    }
}
