use std::{
    io::{self, Stdout},
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use realtime_plotting::{ChartState, RenderSurface, SurfaceEvent};

use crate::ui::draw;

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Render surface drawing the chart panels in the terminal.
///
/// Takes over the terminal (raw mode, alternate screen) for as long as it lives.
pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    _guard: TerminalGuard,
}

impl TerminalSurface {
    /// Enters the alternate screen and draws the waiting screen.
    ///
    /// # Errors
    /// Returns an error if terminal setup or rendering fails.
    pub fn enter() -> io::Result<Self> {
        let guard = TerminalGuard::enter()?;

        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        terminal.draw(|f| draw::draw(f, None))?;

        Ok(Self {
            terminal,
            _guard: guard,
        })
    }

    fn draw(&mut self, chart: &ChartState) -> io::Result<()> {
        self.terminal.draw(|f| draw::draw(f, Some(chart)))?;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl RenderSurface for TerminalSurface {
    fn init(&mut self, chart: &ChartState) -> realtime_plotting::Result<()> {
        Ok(self.draw(chart)?)
    }

    fn render(&mut self, chart: &ChartState) -> realtime_plotting::Result<()> {
        Ok(self.draw(chart)?)
    }

    fn pump(&mut self, timeout: Duration) -> realtime_plotting::Result<SurfaceEvent> {
        if !event::poll(timeout)? {
            return Ok(SurfaceEvent::Idle);
        }

        let event = match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                KeyCode::Char('q') | KeyCode::Esc => SurfaceEvent::Closed,
                // Raw mode swallows SIGINT.
                KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => {
                    SurfaceEvent::Closed
                }
                _ => SurfaceEvent::Idle,
            },
            Event::Resize(..) => SurfaceEvent::RedrawRequested,
            _ => SurfaceEvent::Idle,
        };

        Ok(event)
    }
}
