// Simulation driver: one dispatch decision, one learning step, one frame per tick

use anyhow::{Context, Result};
use serde::Serialize;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use lift_rl_core::{
    ActorCritic, AgentMetrics, Building, Dispatch, ElevatorState, Environment, Episode,
    FeatureVector, RLError, Transition,
};

use crate::config::RunConfig;
use crate::render::{Frame, Renderer};
use crate::stats::RunStats;

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Quit,
    Interrupted,
    StepLimit,
}

/// Logged once when the run ends
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub reason: StopReason,
    pub episode: Option<Episode>,
    pub stats: RunStats,
    pub agent: AgentMetrics,
    pub actor: Vec<f64>,
    pub critic: Vec<f64>,
}

pub struct Simulation<E, R> {
    env: E,
    agent: ActorCritic,
    renderer: R,
    building: Building,
    config: RunConfig,
    stats: RunStats,
}

impl<E, R> Simulation<E, R>
where
    E: Environment<Observation = FeatureVector, Action = Dispatch, State = ElevatorState>,
    R: Renderer,
{
    pub fn new(env: E, agent: ActorCritic, renderer: R, building: Building, config: RunConfig) -> Self {
        Self {
            env,
            agent,
            renderer,
            building,
            config,
            stats: RunStats::default(),
        }
    }

    /// Run until quit, Ctrl-C or the step limit; the renderer is closed on every path
    pub async fn run(self) -> Result<RunSummary> {
        self.run_until(tokio::signal::ctrl_c()).await
    }

    /// Like [`Simulation::run`], with `interrupt` in place of Ctrl-C
    pub async fn run_until<F>(mut self, interrupt: F) -> Result<RunSummary>
    where
        F: Future<Output = io::Result<()>>,
    {
        let outcome = self.run_loop(interrupt).await;
        let closed = self.renderer.close();
        let env_closed = self.env.close().await;

        let reason = outcome?;
        closed?;
        env_closed?;

        let summary = RunSummary {
            reason,
            episode: self.env.episode_info(),
            stats: self.stats,
            agent: self.agent.metrics(),
            actor: self.agent.actor().params().to_vec(),
            critic: self.agent.critic().weights().to_vec(),
        };
        tracing::info!(
            ?reason,
            ticks = summary.stats.ticks,
            mean_reward = summary.stats.mean_reward(),
            actor = ?summary.actor,
            critic = ?summary.critic,
            "simulation finished"
        );
        Ok(summary)
    }

    async fn run_loop<F>(&mut self, interrupt: F) -> Result<StopReason>
    where
        F: Future<Output = io::Result<()>>,
    {
        tokio::pin!(interrupt);

        // the first poll registers the signal handler, so it must precede the first tick
        tokio::select! {
            biased;
            signal = &mut interrupt => {
                signal.context("Failed to listen for Ctrl-C")?;
                tracing::info!("interrupted before the first tick");
                return Ok(StopReason::Interrupted);
            }
            () = std::future::ready(()) => {}
        }

        self.env.reset().await.context("Failed to reset the environment")?;

        let mut clock = tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms));
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        clock.tick().await;

        loop {
            if self.renderer.quit_requested()? {
                tracing::info!("quit requested");
                return Ok(StopReason::Quit);
            }

            if self.tick().await? {
                tracing::info!(ticks = self.stats.ticks, "step limit reached");
                return Ok(StopReason::StepLimit);
            }

            tokio::select! {
                _ = clock.tick() => {}
                signal = &mut interrupt => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    tracing::info!("interrupted");
                    return Ok(StopReason::Interrupted);
                }
            }
        }
    }

    /// One tick; returns whether the environment truncated the run
    async fn tick(&mut self) -> Result<bool> {
        let features = self.env.observation();
        let action = self.agent.act(&features)?;
        let step = self.env.step(action).await?;
        let state = step.state.ok_or_else(|| {
            RLError::Environment("step did not report the served state".into())
        })?;

        let transition = Transition::new(features, action, step.reward, step.observation);
        let update = self.agent.learn(&transition);
        self.stats.record(action, step.reward, &update);

        if self.config.log_interval > 0 && self.stats.ticks % self.config.log_interval == 0 {
            tracing::info!(
                ticks = self.stats.ticks,
                mean_reward = self.stats.mean_reward(),
                reward_ema = self.stats.reward_ema,
                td_error_ema = self.stats.td_error_ema,
                move_rate = self.stats.move_rate(),
                "progress"
            );
        }

        let frame = Frame {
            tick: self.stats.ticks,
            building: self.building,
            state,
            action,
            reward: step.reward,
            update,
            stats: &self.stats,
        };
        self.renderer.draw(&frame)?;

        Ok(step.truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessRenderer;
    use lift_rl_core::{AgentConfig, Step, StepInfo, TrackedEnvironment};
    use lift_rl_env::{ElevatorEnv, ElevatorEnvConfig, TimeLimit};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};

    /// Records frames and asks to quit after a fixed number of them
    struct ScriptedRenderer {
        frames: Arc<Mutex<Vec<ElevatorState>>>,
        quit_after: usize,
        closed: Arc<Mutex<bool>>,
    }

    impl Renderer for ScriptedRenderer {
        fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
            self.frames.lock().unwrap().push(frame.state);
            Ok(())
        }

        fn quit_requested(&mut self) -> Result<bool> {
            Ok(self.frames.lock().unwrap().len() >= self.quit_after)
        }

        fn close(&mut self) -> Result<()> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    /// Elevator that forgets to report the state each step was served in
    struct StatelessEnv(ElevatorEnv);

    #[async_trait::async_trait]
    impl Environment for StatelessEnv {
        type Observation = FeatureVector;
        type Action = Dispatch;
        type State = ElevatorState;

        async fn reset(&mut self) -> lift_rl_core::Result<(FeatureVector, StepInfo)> {
            self.0.reset().await
        }

        fn observation(&self) -> FeatureVector {
            self.0.observation()
        }

        async fn step(
            &mut self,
            action: Dispatch,
        ) -> lift_rl_core::Result<Step<FeatureVector, ElevatorState>> {
            let mut step = self.0.step(action).await?;
            step.state = None;
            Ok(step)
        }
    }

    fn run_config(max_steps: Option<usize>) -> RunConfig {
        RunConfig {
            seed: Some(1),
            max_steps,
            tick_interval_ms: 1,
            log_interval: 5,
        }
    }

    fn parts(seed: u64, max_steps: usize) -> (TrackedEnvironment<TimeLimit<ElevatorEnv>>, ActorCritic) {
        let env = ElevatorEnv::new(ElevatorEnvConfig::default(), StdRng::seed_from_u64(seed)).unwrap();
        let env = TrackedEnvironment::new(TimeLimit::new(env, max_steps));
        let agent = ActorCritic::new(AgentConfig::default(), StdRng::seed_from_u64(seed + 1)).unwrap();
        (env, agent)
    }

    #[tokio::test]
    async fn test_headless_run_stops_at_step_limit() {
        let (env, agent) = parts(3, 25);
        let sim = Simulation::new(env, agent, HeadlessRenderer, Building::default(), run_config(Some(25)));

        let summary = sim.run().await.unwrap();
        assert_eq!(summary.reason, StopReason::StepLimit);
        assert_eq!(summary.stats.ticks, 25);
        assert_eq!(summary.agent.updates, 25);
        assert!(summary.stats.total_reward <= 0.0);
        let episode = summary.episode.unwrap();
        assert_eq!(episode.steps, 25);
        assert!(episode.end_time.is_some());
    }

    #[tokio::test]
    async fn test_quit_closes_renderer() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(false));
        let renderer = ScriptedRenderer {
            frames: frames.clone(),
            quit_after: 4,
            closed: closed.clone(),
        };
        let (env, agent) = parts(8, usize::MAX);
        let sim = Simulation::new(env, agent, renderer, Building::default(), run_config(None));

        let summary = sim.run().await.unwrap();
        assert_eq!(summary.reason, StopReason::Quit);
        assert_eq!(summary.stats.ticks, 4);
        assert!(*closed.lock().unwrap());

        let building = Building::default();
        for state in frames.lock().unwrap().iter() {
            assert!(state.check(&building).is_ok());
            assert!(state.target_floor < building.max_floor);
        }
    }

    #[tokio::test]
    async fn test_seeded_runs_match() {
        let summarize = |seed| async move {
            let (env, agent) = parts(seed, 30);
            Simulation::new(env, agent, HeadlessRenderer, Building::default(), run_config(Some(30)))
                .run()
                .await
                .unwrap()
        };
        let a = summarize(21).await;
        let b = summarize(21).await;
        assert_eq!(a.actor, b.actor);
        assert_eq!(a.critic, b.critic);
        assert_eq!(a.stats.moves, b.stats.moves);
    }

    #[tokio::test]
    async fn test_interrupt_before_first_tick() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(Mutex::new(false));
        let renderer = ScriptedRenderer {
            frames: frames.clone(),
            quit_after: usize::MAX,
            closed: closed.clone(),
        };
        let (env, agent) = parts(5, 100);
        let sim = Simulation::new(env, agent, renderer, Building::default(), run_config(Some(100)));

        let summary = sim.run_until(std::future::ready(Ok(()))).await.unwrap();
        assert_eq!(summary.reason, StopReason::Interrupted);
        assert_eq!(summary.stats.ticks, 0);
        assert_eq!(summary.agent.updates, 0);
        assert!(frames.lock().unwrap().is_empty());
        assert!(*closed.lock().unwrap());
    }

    #[tokio::test]
    async fn test_missing_served_state_is_an_environment_error() {
        let env = ElevatorEnv::new(ElevatorEnvConfig::default(), StdRng::seed_from_u64(2)).unwrap();
        let agent = ActorCritic::new(AgentConfig::default(), StdRng::seed_from_u64(3)).unwrap();
        let sim = Simulation::new(
            StatelessEnv(env),
            agent,
            HeadlessRenderer,
            Building::default(),
            run_config(Some(5)),
        );

        let err = sim.run_until(std::future::pending()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RLError>(),
            Some(RLError::Environment(_))
        ));
    }
}
