// Backend-neutral drawing: a frame becomes a list of shapes on the logical canvas

use super::{Frame, Layout, Point, Rect, CANVAS_HEIGHT, CANVAS_WIDTH, LINE_SPACING, TEXT_X, TEXT_Y};

pub type Rgb = [f32; 3];

pub const WHITE: Rgb = [1.0, 1.0, 1.0];
pub const BLACK: Rgb = [0.0, 0.0, 0.0];
pub const RED: Rgb = [1.0, 0.0, 0.0];
pub const BLUE: Rgb = [0.0, 0.0, 1.0];

const OUTLINE_WIDTH: f64 = 2.0;
const FLOOR_LINE_WIDTH: f64 = 2.0;
const MARKER_RADIUS: f64 = 10.0;
const LABEL_RAISE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Rgb },
    StrokeRect { rect: Rect, width: f64, color: Rgb },
    Line { from: Point, to: Point, width: f64, color: Rgb },
    Circle { center: Point, radius: f64, color: Rgb },
    Text { origin: Point, text: String, color: Rgb },
}

/// Everything needed to paint one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub background: Rgb,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    /// Building outline, floor lines with labels, car, call marker, then the overlay
    pub fn from_frame(frame: &Frame<'_>) -> Self {
        let layout = Layout::new(frame.building);
        let outline = layout.outline();
        let mut commands = vec![DrawCommand::StrokeRect {
            rect: outline,
            width: OUTLINE_WIDTH,
            color: BLACK,
        }];

        for (floor, y) in layout.floor_lines() {
            commands.push(DrawCommand::Line {
                from: Point { x: outline.x, y },
                to: Point {
                    x: outline.x + outline.w,
                    y,
                },
                width: FLOOR_LINE_WIDTH,
                color: BLACK,
            });
            commands.push(DrawCommand::Text {
                origin: Point {
                    x: layout.label_x(),
                    y: y - LABEL_RAISE,
                },
                text: floor.to_string(),
                color: BLACK,
            });
        }

        commands.push(DrawCommand::FillRect {
            rect: layout.car(frame.state.current_floor),
            color: BLUE,
        });
        commands.push(DrawCommand::Circle {
            center: layout.target_marker(frame.state.target_floor),
            radius: MARKER_RADIUS,
            color: RED,
        });

        let mut y = TEXT_Y;
        for line in frame.overlay_lines() {
            commands.push(DrawCommand::Text {
                origin: Point { x: TEXT_X, y },
                text: line,
                color: BLACK,
            });
            y += LINE_SPACING;
        }

        Self {
            width: CANVAS_WIDTH,
            height: layout.height().max(CANVAS_HEIGHT),
            background: WHITE,
            commands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::RunStats;
    use lift_rl_core::{Building, Dispatch, ElevatorState, Reward, TdUpdate};

    fn texts(scene: &Scene) -> Vec<&str> {
        scene
            .commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn frame(stats: &RunStats, building: Building, state: ElevatorState) -> Frame<'_> {
        Frame {
            tick: 12,
            building,
            state,
            action: Dispatch::Stay,
            reward: Reward(-3.5),
            update: TdUpdate {
                value: 0.2,
                next_value: 0.1,
                td_error: -3.6,
                move_probability: 0.7,
                gradient: -0.7,
            },
            stats,
        }
    }

    #[test]
    fn test_scene_draws_every_element() {
        let stats = RunStats::default();
        let building = Building::default();
        let state = ElevatorState {
            current_floor: 2,
            target_floor: 7,
            passengers: 3,
        };
        let scene = Scene::from_frame(&frame(&stats, building, state));
        let layout = Layout::new(building);

        assert_eq!(scene.background, WHITE);
        assert_eq!((scene.width, scene.height), (CANVAS_WIDTH, CANVAS_HEIGHT));
        assert_eq!(
            scene.commands[0],
            DrawCommand::StrokeRect {
                rect: layout.outline(),
                width: OUTLINE_WIDTH,
                color: BLACK,
            }
        );

        let lines = scene
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        assert_eq!(lines, 11);

        assert!(scene.commands.contains(&DrawCommand::FillRect {
            rect: layout.car(2),
            color: BLUE,
        }));
        assert!(scene.commands.contains(&DrawCommand::Circle {
            center: layout.target_marker(7),
            radius: MARKER_RADIUS,
            color: RED,
        }));
    }

    #[test]
    fn test_scene_labels_and_overlay() {
        let stats = RunStats::default();
        let state = ElevatorState {
            current_floor: 4,
            target_floor: 1,
            passengers: 0,
        };
        let f = frame(&stats, Building::default(), state);
        let scene = Scene::from_frame(&f);
        let texts = texts(&scene);

        // floor labels top floor first, then the overlay
        assert_eq!(texts[0], "10");
        assert_eq!(texts[10], "0");
        let overlay = f.overlay_lines();
        assert_eq!(texts[11..], overlay.iter().map(String::as_str).collect::<Vec<_>>()[..]);

        let origins: Vec<f64> = scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { origin, .. } if origin.x == TEXT_X => Some(origin.y),
                _ => None,
            })
            .collect();
        assert_eq!(origins[0], TEXT_Y);
        assert_eq!(origins[1] - origins[0], LINE_SPACING);
    }

    #[test]
    fn test_tall_building_extends_canvas() {
        let stats = RunStats::default();
        let building = Building {
            max_floor: 20,
            capacity: 8,
        };
        let scene = Scene::from_frame(&frame(&stats, building, ElevatorState::default()));
        assert_eq!(scene.height, Layout::new(building).height());
        assert!(scene.height > CANVAS_HEIGHT);
    }
}
