//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, Status};

/// Accent for the focused field and the header.
pub const GOLD: Color = Color::Rgb(255, 215, 0);
/// Background of destructive confirmations.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
/// Status bar background.
pub const SLATE: Color = Color::Rgb(40, 48, 64);

pub fn status_color(status: Status) -> Color {
    match status {
        Status::NotStarted => Color::Gray,
        Status::InProgress => Color::Cyan,
        Status::Completed => Color::Green,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Blue,
    }
}
