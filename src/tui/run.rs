//! TUI entry point and terminal setup.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::{
    cursor::Show,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tokio::runtime::Handle;
use tracing::error;

use crate::image_edit::ImageEditor;
use crate::store::TaskStore;
use crate::tui::app::App;

/// Leave raw mode and the alternate screen and show the cursor again.
pub fn restore_terminal<W: Write>(out: &mut W) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(out, LeaveAlternateScreen, DisableMouseCapture, Show)
}

/// Restores the terminal when dropped, including while unwinding from a panic.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = restore_terminal(&mut io::stdout()) {
            error!(error = %e, "failed to restore terminal");
        }
    }
}

/// Take over the terminal and run the UI until the user quits.
pub fn run_tui(store: TaskStore, image_editor: Option<Arc<dyn ImageEditor>>, runtime: Handle) -> io::Result<()> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, image_editor, runtime);
    app.run(&mut terminal)
}
