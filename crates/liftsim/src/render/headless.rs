use anyhow::Result;

use super::{Frame, Renderer};

/// Renderer without a display: every frame becomes a log event
#[derive(Debug, Default)]
pub struct HeadlessRenderer;

impl Renderer for HeadlessRenderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        tracing::info!(
            tick = frame.tick,
            current = frame.state.current_floor,
            target = frame.state.target_floor,
            passengers = frame.state.passengers,
            action = %frame.action,
            reward = format_args!("{:.2}", frame.reward.value()),
            "frame"
        );
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        Ok(false)
    }
}
