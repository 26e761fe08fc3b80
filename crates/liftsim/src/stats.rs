// Running statistics over the ticks of a simulation

use serde::Serialize;

use lift_rl_core::{Dispatch, Reward, TdUpdate};

/// Smoothing factor of the moving averages
const EMA_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub ticks: u64,
    pub moves: u64,
    pub total_reward: f64,
    pub reward_ema: f64,
    pub td_error_ema: f64,
}

impl RunStats {
    pub fn record(&mut self, action: Dispatch, reward: Reward, update: &TdUpdate) {
        self.ticks += 1;
        if action.is_move() {
            self.moves += 1;
        }
        self.total_reward += reward.value();

        let abs_td = update.td_error.abs();
        if self.ticks == 1 {
            self.reward_ema = reward.value();
            self.td_error_ema = abs_td;
        } else {
            self.reward_ema += EMA_ALPHA * (reward.value() - self.reward_ema);
            self.td_error_ema += EMA_ALPHA * (abs_td - self.td_error_ema);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn mean_reward(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.total_reward / self.ticks as f64
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn move_rate(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.moves as f64 / self.ticks as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn update(td_error: f64) -> TdUpdate {
        TdUpdate {
            value: 0.0,
            next_value: 0.0,
            td_error,
            move_probability: 0.5,
            gradient: 0.5,
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = RunStats::default();
        assert_eq!(stats.mean_reward(), 0.0);
        assert_eq!(stats.move_rate(), 0.0);
    }

    #[test]
    fn test_record() {
        let mut stats = RunStats::default();
        stats.record(Dispatch::Move, Reward(-2.0), &update(-1.0));
        assert_relative_eq!(stats.reward_ema, -2.0);
        assert_relative_eq!(stats.td_error_ema, 1.0);

        stats.record(Dispatch::Stay, Reward(0.0), &update(3.0));
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.moves, 1);
        assert_relative_eq!(stats.mean_reward(), -1.0);
        assert_relative_eq!(stats.move_rate(), 0.5);
        assert_relative_eq!(stats.reward_ema, -1.8, epsilon = 1e-12);
        assert_relative_eq!(stats.td_error_ema, 1.2, epsilon = 1e-12);
    }
}
