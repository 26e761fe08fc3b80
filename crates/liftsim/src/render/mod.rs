// Rendering capability and the geometry shared by every backend
//
// Geometry is expressed in an 800x600 logical canvas; backends scale it to
// whatever surface they draw on.

use anyhow::Result;

use lift_rl_core::{Building, Dispatch, ElevatorState, Reward, TdUpdate};

use crate::stats::RunStats;

mod headless;
pub mod scene;
mod terminal;
#[cfg(feature = "window")]
mod window;

pub use headless::HeadlessRenderer;
pub use terminal::TerminalRenderer;
#[cfg(feature = "window")]
pub use window::WindowRenderer;

pub const TITLE: &str = "Elevator Actor-Critic Simulation";

pub const CANVAS_WIDTH: f64 = 800.0;
pub const CANVAS_HEIGHT: f64 = 600.0;

const TOP_MARGIN: f64 = 50.0;
const BUILDING_X: f64 = 300.0;
const BUILDING_WIDTH: f64 = 200.0;
const FLOOR_HEIGHT: f64 = 50.0;
const CAR_OFFSET_X: f64 = 50.0;
const CAR_WIDTH: f64 = 100.0;
const CAR_HEIGHT: f64 = 40.0;
const MARKER_OFFSET_X: f64 = 20.0;
const LABEL_OFFSET_X: f64 = 30.0;
pub const TEXT_X: f64 = 20.0;
pub const TEXT_Y: f64 = 20.0;
pub const LINE_SPACING: f64 = 30.0;

/// Something that can show one tick of the simulation
pub trait Renderer {
    /// Draw a frame
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()>;

    /// Drain pending input; `true` once the user asked to quit
    fn quit_requested(&mut self) -> Result<bool>;

    /// Release the display surface
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Everything a renderer may show about one tick
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub tick: u64,
    pub building: Building,
    /// State after the action, with the call that was served
    pub state: ElevatorState,
    pub action: Dispatch,
    pub reward: Reward,
    pub update: TdUpdate,
    pub stats: &'a RunStats,
}

impl Frame<'_> {
    /// Text overlay, one entry per line
    pub fn overlay_lines(&self) -> Vec<String> {
        vec![
            format!("Current floor: {}", self.state.current_floor),
            format!("Target floor: {}", self.state.target_floor),
            format!("Passengers: {}", self.state.passengers),
            format!("Reward: {:.2}", self.reward.value()),
            format!("Tick: {}", self.tick),
            format!("Action: {}", self.action),
            format!("P(move): {:.2}", self.update.move_probability),
            format!("TD error: {:.2}", self.update.td_error),
            format!("Mean reward: {:.2}", self.stats.mean_reward()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Logical positions of the building, floors, car and call marker
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    building: Building,
}

impl Layout {
    pub fn new(building: Building) -> Self {
        Self { building }
    }

    /// Y of the line a floor's car rests on; the top floor is nearest the top
    pub fn floor_y(&self, floor: u32) -> f64 {
        let above = self.building.max_floor.saturating_sub(floor);
        TOP_MARGIN + f64::from(above) * FLOOR_HEIGHT
    }

    pub fn outline(&self) -> Rect {
        Rect {
            x: BUILDING_X,
            y: TOP_MARGIN,
            w: BUILDING_WIDTH,
            h: f64::from(self.building.levels()) * FLOOR_HEIGHT,
        }
    }

    /// `(floor, y)` for every floor line, top floor first
    pub fn floor_lines(&self) -> Vec<(u32, f64)> {
        (0..=self.building.max_floor)
            .rev()
            .map(|floor| (floor, self.floor_y(floor)))
            .collect()
    }

    /// Left edge of the floor labels
    pub fn label_x(&self) -> f64 {
        BUILDING_X - LABEL_OFFSET_X
    }

    pub fn car(&self, floor: u32) -> Rect {
        Rect {
            x: BUILDING_X + CAR_OFFSET_X,
            y: self.floor_y(floor) - CAR_HEIGHT,
            w: CAR_WIDTH,
            h: CAR_HEIGHT,
        }
    }

    pub fn target_marker(&self, floor: u32) -> Point {
        Point {
            x: BUILDING_X + MARKER_OFFSET_X,
            y: self.floor_y(floor),
        }
    }

    /// Bottom of the building outline
    pub fn height(&self) -> f64 {
        let outline = self.outline();
        outline.y + outline.h
    }
}
