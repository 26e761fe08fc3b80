//! Example: train the dispatch actor-critic without any display

use lift_rl_core::{ActorCritic, AgentConfig, Environment, Transition, TrackedEnvironment};
use lift_rl_env::{ElevatorEnv, ElevatorEnvConfig, TimeLimit};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let env = ElevatorEnv::new(ElevatorEnvConfig::default(), StdRng::seed_from_u64(7))?;
    let mut env = TrackedEnvironment::new(TimeLimit::new(env, 5_000));
    let mut agent = ActorCritic::new(AgentConfig::default(), StdRng::seed_from_u64(8))?;

    env.reset().await?;
    let mut window = Vec::with_capacity(500);

    loop {
        let features = env.observation();
        let action = agent.act(&features)?;
        let step = env.step(action).await?;
        agent.learn(&Transition::new(features, action, step.reward, step.observation));

        window.push(step.reward.value());
        if window.len() == 500 {
            let avg = window.iter().sum::<f64>() / window.len() as f64;
            println!(
                "steps {:>5}: mean reward {:>7.3}, mean |td| {:.3}",
                env.step_count,
                avg,
                agent.metrics().mean_abs_td_error
            );
            window.clear();
        }

        if step.done || step.truncated {
            break;
        }
    }

    println!("\nactor:  {:?}", agent.actor().params().to_vec());
    println!("critic: {:?}", agent.critic().weights().to_vec());

    env.close().await?;
    Ok(())
}
