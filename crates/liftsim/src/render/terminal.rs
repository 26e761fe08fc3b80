use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use crossterm::{execute, queue};
use std::fmt::Display;
use std::io::{self, Stdout, Write};
use std::time::Duration;

use super::{Frame, Layout, Renderer, CANVAS_HEIGHT, CANVAS_WIDTH, TEXT_X, TEXT_Y, TITLE};

/// Full-screen terminal view; `q`, `Esc` or `Ctrl-C` closes it
///
/// Raw mode and the alternate screen are released in `close` and again in
/// `Drop`, so the terminal is restored on error paths too.
pub struct TerminalRenderer {
    out: Stdout,
    active: bool,
}

impl TerminalRenderer {
    pub fn new() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        let mut renderer = Self {
            out: io::stdout(),
            active: true,
        };
        execute!(renderer.out, EnterAlternateScreen, Hide, SetTitle(TITLE))
            .context("Failed to enter the alternate screen")?;
        Ok(renderer)
    }

    fn put(&mut self, col: u16, row: u16, text: impl Display) -> Result<()> {
        queue!(self.out, MoveTo(col, row), Print(text))?;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if self.active {
            self.active = false;
            execute!(self.out, ResetColor, Show, LeaveAlternateScreen)?;
            terminal::disable_raw_mode()?;
        }
        Ok(())
    }
}

impl Renderer for TerminalRenderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        let (cols, rows) = terminal::size().context("Failed to query terminal size")?;
        let layout = Layout::new(frame.building);
        let vp = Viewport::new(cols, rows, layout.height().max(CANVAS_HEIGHT));

        queue!(self.out, ResetColor, Clear(ClearType::All))?;

        let outline = layout.outline();
        let (left, top) = (vp.col(outline.x), vp.row(outline.y));
        let (right, bottom) = (vp.col(outline.x + outline.w), vp.row(outline.y + outline.h));
        for col in left..=right {
            self.put(col, top, '─')?;
            self.put(col, bottom, '─')?;
        }
        for row in top..=bottom {
            self.put(left, row, '│')?;
            self.put(right, row, '│')?;
        }
        self.put(left, top, '┌')?;
        self.put(right, top, '┐')?;
        self.put(left, bottom, '└')?;
        self.put(right, bottom, '┘')?;

        let label_col = vp.col(layout.label_x());
        for (floor, y) in layout.floor_lines() {
            let row = vp.row(y);
            for col in left + 1..right {
                self.put(col, row, '─')?;
            }
            self.put(label_col, row, floor)?;
        }

        let car = layout.car(frame.state.current_floor);
        let car_top = vp.row(car.y);
        let car_bottom = vp.row(car.y + car.h).max(car_top + 1);
        let (car_left, car_right) = (vp.col(car.x), vp.col(car.x + car.w));
        let width = usize::from(car_right.saturating_sub(car_left).max(1));
        queue!(self.out, SetForegroundColor(Color::Blue))?;
        for row in car_top..car_bottom {
            self.put(car_left, row, "█".repeat(width))?;
        }

        let marker = layout.target_marker(frame.state.target_floor);
        queue!(self.out, SetForegroundColor(Color::Red))?;
        self.put(vp.col(marker.x), vp.row(marker.y), '●')?;
        queue!(self.out, ResetColor)?;

        let (text_col, text_row) = (vp.col(TEXT_X), vp.row(TEXT_Y));
        for (row, line) in (text_row..).zip(frame.overlay_lines()) {
            self.put(text_col, row, line)?;
        }
        self.put(text_col, rows.saturating_sub(1), "q / Esc: quit")?;

        self.out.flush()?;
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.restore().context("Failed to restore the terminal")
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            tracing::warn!("terminal restore failed: {e}");
        }
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Maps logical canvas coordinates onto terminal cells
#[derive(Debug, Clone, Copy)]
struct Viewport {
    cols: u16,
    rows: u16,
    height: f64,
}

impl Viewport {
    fn new(cols: u16, rows: u16, height: f64) -> Self {
        Self { cols, rows, height }
    }

    fn col(&self, x: f64) -> u16 {
        scale(x, CANVAS_WIDTH, self.cols)
    }

    fn row(&self, y: f64) -> u16 {
        scale(y, self.height, self.rows)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(v: f64, extent: f64, cells: u16) -> u16 {
    let last = f64::from(cells.saturating_sub(1));
    (v * f64::from(cells) / extent).floor().clamp(0.0, last) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_scaling() {
        let vp = Viewport::new(80, 24, CANVAS_HEIGHT);
        assert_eq!(vp.col(0.0), 0);
        assert_eq!(vp.col(300.0), 30);
        assert_eq!(vp.col(500.0), 50);
        assert_eq!(vp.row(50.0), 2);
        assert_eq!(vp.row(550.0), 22);
        // the bottom edge clamps to the last row
        assert_eq!(vp.row(CANVAS_HEIGHT), 23);
        assert_eq!(vp.col(-10.0), 0);
    }

    #[test]
    fn test_quit_keys() {
        let press = |code, modifiers| KeyEvent::new(code, modifiers);
        assert!(is_quit_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&press(KeyCode::Enter, KeyModifiers::NONE)));
    }
}
