// liftsim: single-elevator dispatch learned online by a linear actor-critic

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use lift_rl_core::{ActorCritic, TrackedEnvironment};
use lift_rl_env::{ElevatorEnv, TimeLimit};

mod config;
mod render;
mod runner;
mod stats;

use config::SimConfig;
use render::{HeadlessRenderer, TerminalRenderer};
use runner::Simulation;

#[derive(Parser, Debug)]
#[command(name = "liftsim")]
#[command(about = "Elevator dispatch learned online by a linear actor-critic", version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the scenario and policy random sources
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(short = 'n', long)]
    steps: Option<usize>,

    /// Milliseconds between ticks
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Where frames are shown
    #[arg(long, value_enum, default_value_t = RendererKind::Window)]
    renderer: RendererKind,

    /// Log frames instead of drawing them (same as `--renderer headless`)
    #[arg(long, conflicts_with = "renderer")]
    headless: bool,

    /// Write logs to this file (the terminal view discards them otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum RendererKind {
    /// Desktop window
    Window,
    /// Full-screen terminal view
    Terminal,
    /// Frames become log events
    Headless,
}

impl Cli {
    fn renderer_kind(&self) -> RendererKind {
        if self.headless {
            RendererKind::Headless
        } else {
            self.renderer
        }
    }

    fn apply(&self, config: &mut SimConfig) {
        if let Some(seed) = self.seed {
            config.run.seed = Some(seed);
        }
        if let Some(steps) = self.steps {
            config.run.max_steps = Some(steps);
        }
        if let Some(interval) = self.interval_ms {
            config.run.tick_interval_ms = interval;
        }
    }
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else if cli.renderer_kind() == RendererKind::Terminal {
        // the terminal view owns the screen
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let mut config = SimConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let mut master = match config.run.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let env_rng = StdRng::from_rng(&mut master).context("Failed to seed the scenario generator")?;
    let agent_rng = StdRng::from_rng(&mut master).context("Failed to seed the policy")?;

    let building = config.env.building;
    let env = ElevatorEnv::new(config.env, env_rng)?;
    let env = TrackedEnvironment::new(TimeLimit::new(env, config.run.max_steps.unwrap_or(usize::MAX)));
    let agent = ActorCritic::new(config.agent, agent_rng)?;

    tracing::info!(
        seed = ?config.run.seed,
        max_floor = building.max_floor,
        capacity = building.capacity,
        gamma = config.agent.gamma,
        "starting simulation"
    );

    let summary = match cli.renderer_kind() {
        RendererKind::Headless => {
            Simulation::new(env, agent, HeadlessRenderer, building, config.run).run().await?
        }
        RendererKind::Terminal => {
            let renderer = TerminalRenderer::new()?;
            Simulation::new(env, agent, renderer, building, config.run).run().await?
        }
        #[cfg(feature = "window")]
        RendererKind::Window => {
            let renderer = render::WindowRenderer::new().await?;
            Simulation::new(env, agent, renderer, building, config.run).run().await?
        }
        #[cfg(not(feature = "window"))]
        RendererKind::Window => {
            anyhow::bail!("built without the `window` feature; use --renderer terminal or --headless")
        }
    };

    tracing::info!(summary = %serde_json::to_string(&summary)?, "run summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_the_default_renderer() {
        let cli = Cli::parse_from(["liftsim"]);
        assert_eq!(cli.renderer_kind(), RendererKind::Window);
    }

    #[test]
    fn test_renderer_selection() {
        let cli = Cli::parse_from(["liftsim", "--headless"]);
        assert_eq!(cli.renderer_kind(), RendererKind::Headless);
        let cli = Cli::parse_from(["liftsim", "--renderer", "terminal"]);
        assert_eq!(cli.renderer_kind(), RendererKind::Terminal);
        assert!(Cli::try_parse_from(["liftsim", "--headless", "--renderer", "window"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["liftsim", "--seed", "9", "-n", "40", "--interval-ms", "5"]);
        let mut config = SimConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.run.seed, Some(9));
        assert_eq!(config.run.max_steps, Some(40));
        assert_eq!(config.run.tick_interval_ms, 5);
    }
}
