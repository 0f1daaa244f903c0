use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::io::{self, Write};

use super::bars::layout;
use super::{Frame, Renderer};

/// Vertical resolution of one character cell.
const CELL_STEPS: u32 = 8;
const GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_COLOR: &str = "\x1b[38;2;200;50;50m";
const OVERLAY_COLOR: &str = "\x1b[38;2;0;158;47m";
const RESET: &str = "\x1b[0m";
const OVERLAY_LINES: u16 = 7;
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Draws the bins as a bar graph with ANSI escapes.
pub struct TerminalRenderer<W: Write> {
    out: W,
    size: Option<(u16, u16)>,
    overlay: bool,
    started: bool,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(size: Option<(u16, u16)>, overlay: bool) -> Self {
        Self::new(io::stdout(), size, overlay)
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// `size` is `(columns, rows)`; without it the terminal is queried every
    /// frame so resizes are picked up.
    pub fn new(out: W, size: Option<(u16, u16)>, overlay: bool) -> Self {
        Self {
            out,
            size,
            overlay,
            started: false,
        }
    }

    fn area(&self) -> (u16, u16) {
        let (cols, rows) = self.size.unwrap_or_else(terminal_size);
        let reserved = if self.overlay { OVERLAY_LINES } else { 0 };
        (cols.max(1), rows.saturating_sub(reserved + 1).max(1))
    }

    fn draw(&self, frame: &Frame<'_>) -> String {
        let (cols, rows) = self.area();
        let heights = column_heights(frame.bins, cols as u32, rows as u32 * CELL_STEPS);

        let mut screen = String::with_capacity((cols as usize + 16) * (rows as usize + 8));
        screen.push_str("\x1b[H");
        screen.push_str(BAR_COLOR);
        for row in 0..rows as u32 {
            let floor = (rows as u32 - 1 - row) * CELL_STEPS;
            for &h in &heights {
                let fill = h.saturating_sub(floor).min(CELL_STEPS);
                screen.push(GLYPHS[fill as usize]);
            }
            screen.push_str("\x1b[K\n");
        }
        screen.push_str(RESET);

        if self.overlay {
            screen.push_str(OVERLAY_COLOR);
            for line in overlay_lines(frame) {
                let _ = writeln!(screen, "{}\x1b[K", line);
            }
            screen.push_str(RESET);
        }
        screen.push_str("\x1b[J");
        screen
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) -> Result<()> {
        if !self.started {
            self.out.write_all(b"\x1b[2J\x1b[?25l")?;
            self.started = true;
        }
        let screen = self.draw(frame);
        self.out
            .write_all(screen.as_bytes())
            .and_then(|_| self.out.flush())
            .context("Failed to draw to terminal")
    }

    fn toggle_overlay(&mut self) {
        self.overlay = !self.overlay;
    }

    fn finish(&mut self) -> Result<()> {
        if self.started {
            self.started = false;
            self.out.write_all(b"\x1b[?25h\n")?;
            self.out.flush()?;
        }
        Ok(())
    }
}

impl<W: Write> Drop for TerminalRenderer<W> {
    fn drop(&mut self) {
        if self.started {
            let _ = self.out.write_all(b"\x1b[?25h\n");
            let _ = self.out.flush();
        }
    }
}

/// Height of each terminal column in eighth-cells.
///
/// Several bins may share a column when the terminal is narrower than the
/// bin count; the column shows the tallest of them.
pub fn column_heights(bins: &[f32], cols: u32, steps: u32) -> Vec<u32> {
    let mut heights = vec![0u32; cols as usize];
    for bar in layout(bins, cols, steps) {
        debug_assert_eq!(bar.y + bar.height, steps);
        let end = (bar.x + bar.width.max(1)).min(cols);
        for h in &mut heights[bar.x.min(cols) as usize..end as usize] {
            *h = (*h).max(bar.height);
        }
    }
    heights
}

fn overlay_lines(frame: &Frame<'_>) -> [String; OVERLAY_LINES as usize] {
    let c = frame.config;
    [
        format!("filter_mode: {} ({})", c.mode.number(), c.mode),
        format!("filter_range: {}", c.range),
        format!("decay: {}%", c.decay),
        format!("alpha: {:.6}", c.alpha),
        format!("source: {}", frame.source),
        format!("amp_scalar: {}", c.amp_scalar),
        format!("{:.0} ticks/s", frame.ticks_per_second),
    ]
}

#[cfg(unix)]
fn terminal_size() -> (u16, u16) {
    // SAFETY: TIOCGWINSZ only writes into the provided winsize.
    unsafe {
        let mut size: libc::winsize = std::mem::zeroed();
        if libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut size) == 0 && size.ws_col > 0 {
            (size.ws_col, size.ws_row)
        } else {
            FALLBACK_SIZE
        }
    }
}

#[cfg(not(unix))]
fn terminal_size() -> (u16, u16) {
    FALLBACK_SIZE
}
