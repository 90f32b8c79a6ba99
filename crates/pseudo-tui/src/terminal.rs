//! Terminal lifecycle.
//!
//! [`TerminalSession`] owns the raw-mode, alternate-screen terminal and puts
//! it back on drop. The panic hook covers the paths where drop never runs.

use std::io::{self, Stdout};
use std::panic;

use anyhow::{Context, Result};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type ChatTerminal = Terminal<CrosstermBackend<Stdout>>;

pub struct TerminalSession {
    terminal: ChatTerminal,
    restored: bool,
}

impl TerminalSession {
    /// Enters raw mode and the alternate screen with mouse capture and
    /// bracketed paste on.
    ///
    /// # Errors
    /// Returns an error if the terminal refuses any of the mode switches.
    pub fn enter() -> Result<Self> {
        install_panic_hook();
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(
            stdout,
            EnterAlternateScreen,
            EnableBracketedPaste,
            EnableMouseCapture
        ) {
            let _ = restore_terminal();
            return Err(err).context("Failed to enter alternate screen");
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = restore_terminal();
                return Err(err).context("Failed to create terminal");
            }
        };
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    pub fn terminal(&mut self) -> &mut ChatTerminal {
        &mut self.terminal
    }

    /// Restores the terminal now instead of on drop.
    ///
    /// # Errors
    /// Returns an error if leaving the alternate screen or raw mode fails.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        let _ = self.terminal.show_cursor();
        restore_terminal()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!("failed to restore terminal: {err:#}");
        }
    }
}

/// Leaves every mode [`TerminalSession::enter`] switches on.
///
/// Idempotent; the mouse and paste modes are dropped before raw mode.
///
/// # Errors
/// Returns an error if leaving the alternate screen or raw mode fails.
pub fn restore_terminal() -> Result<()> {
    let _ = execute!(io::stdout(), DisableMouseCapture, DisableBracketedPaste);
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Restores the terminal before the default hook prints the panic.
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
