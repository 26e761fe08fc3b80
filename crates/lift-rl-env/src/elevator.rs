//! The single-elevator dispatch environment
//!
//! Every step serves one call: the reward is the cost of the call as seen
//! from where the car stands, the car snaps to the call floor if the action
//! says so, and a fresh call is drawn for the next decision. The car's
//! position carries over from call to call, so the task never terminates.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use lift_rl_core::{
    Building, CostModel, Dispatch, DispatchReward, ElevatorState, Environment, FeatureExtractor,
    FeatureScales, FeatureVector, Result, RewardFunction, Step, StepInfo,
};

/// Configuration for the elevator environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevatorEnvConfig {
    /// Floors and passenger capacity
    pub building: Building,
    /// Energy/wait coefficients shared by the reward and the features
    pub costs: CostModel,
    /// Feature normalisers
    pub scales: FeatureScales,
}

/// A call: where the car is wanted and how many people are waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Requested floor
    pub target_floor: u32,
    /// Waiting passengers
    pub passengers: u32,
}

/// Draws random calls for a building
#[derive(Debug, Clone, Copy)]
pub struct ScenarioGenerator {
    building: Building,
}

impl ScenarioGenerator {
    /// Create a generator; the building must have a non-empty floor range
    pub fn new(building: Building) -> Result<Self> {
        building.validate()?;
        Ok(Self { building })
    }

    /// Target in `0..max_floor`, passengers in `0..capacity`
    ///
    /// The top floor is never requested.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Call {
        Call {
            target_floor: rng.gen_range(0..self.building.max_floor),
            passengers: rng.gen_range(0..self.building.capacity),
        }
    }
}

/// Elevator environment with an injected random source
pub struct ElevatorEnv<R = StdRng> {
    state: ElevatorState,
    extractor: FeatureExtractor,
    reward_fn: DispatchReward,
    scenarios: ScenarioGenerator,
    building: Building,
    rng: R,
    steps: usize,
}

impl<R: Rng + Send + Sync> ElevatorEnv<R> {
    /// Create a new elevator environment; the car starts idle at the ground floor
    pub fn new(config: ElevatorEnvConfig, rng: R) -> Result<Self> {
        let extractor = FeatureExtractor::new(config.building, config.costs, config.scales)?;
        Ok(Self {
            state: ElevatorState::default(),
            extractor,
            reward_fn: DispatchReward::new(config.costs),
            scenarios: ScenarioGenerator::new(config.building)?,
            building: config.building,
            rng,
            steps: 0,
        })
    }

    /// Current state, including the pending call
    #[must_use]
    pub fn state(&self) -> &ElevatorState {
        &self.state
    }

    /// The building being served
    #[must_use]
    pub fn building(&self) -> &Building {
        &self.building
    }

    /// Steps taken since the last reset
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn draw_call(&mut self) {
        let call = self.scenarios.draw(&mut self.rng);
        self.state.target_floor = call.target_floor;
        self.state.passengers = call.passengers;
        tracing::debug!(
            current = self.state.current_floor,
            target = call.target_floor,
            passengers = call.passengers,
            "new call"
        );
    }
}

#[async_trait]
impl<R: Rng + Send + Sync> Environment for ElevatorEnv<R> {
    type Observation = FeatureVector;
    type Action = Dispatch;
    type State = ElevatorState;

    async fn reset(&mut self) -> Result<(FeatureVector, StepInfo)> {
        self.state = ElevatorState::default();
        self.steps = 0;
        self.draw_call();

        let mut info = StepInfo::default();
        info.insert("target_floor", self.state.target_floor)?;
        info.insert("passengers", self.state.passengers)?;
        Ok((self.observation(), info))
    }

    fn observation(&self) -> FeatureVector {
        self.extractor.extract(&self.state)
    }

    async fn step(&mut self, action: Dispatch) -> Result<Step<FeatureVector, ElevatorState>> {
        self.state.check(&self.building)?;

        let before = self.state;
        let trip = self.extractor.costs().trip(&before);
        if action.is_move() {
            self.state.serve();
        }
        let reward = self.reward_fn.reward(&before, &action, &self.state);
        let served = self.state;
        let observation = self.extractor.extract(&served);
        self.steps += 1;

        let mut info = StepInfo::default();
        info.insert("action", action)?;
        info.insert("distance", trip.distance)?;
        info.insert("energy", trip.energy)?;
        info.insert("wait", trip.wait)?;

        tracing::debug!(
            step = self.steps,
            %action,
            from = before.current_floor,
            to = served.current_floor,
            reward = reward.value(),
            "served call"
        );

        self.draw_call();

        Ok(Step {
            observation,
            reward,
            done: false,
            truncated: false,
            info,
            state: Some(served),
        })
    }
}
