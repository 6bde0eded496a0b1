//! Terminal backend abstraction and crossterm implementation.
//!
//! Entering puts the terminal in raw mode on the alternate screen with mouse
//! capture on, so press and release transitions reach the input service.
//! Leaving restores everything in reverse order.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
        size,
    },
};
use std::io::stdout;
use tracing::{debug, warn};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
    fn set_title(&mut self, title: &str) -> Result<()>;
    /// Current size as (columns, rows).
    fn size(&self) -> Result<(u16, u16)>;
}

pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            execute!(
                stdout(),
                EnterAlternateScreen,
                EnableMouseCapture,
                EnableFocusChange,
                Hide
            )?;
            self.entered = true;
            debug!(target: "terminal", "terminal_entered");
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            execute!(
                stdout(),
                Show,
                DisableFocusChange,
                DisableMouseCapture,
                LeaveAlternateScreen
            )?;
            disable_raw_mode()?;
            self.entered = false;
            debug!(target: "terminal", "terminal_left");
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        execute!(stdout(), SetTitle(title))?;
        Ok(())
    }

    fn size(&self) -> Result<(u16, u16)> {
        Ok(size()?)
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            warn!(target: "terminal", error = %e, "terminal_restore_failed");
        }
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_without_enter_is_noop() {
        let mut backend = CrosstermBackend::new();
        assert!(!backend.is_entered());
        backend.leave().unwrap();
        assert!(!backend.is_entered());
    }
}
