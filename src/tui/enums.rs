//! Enumerations for TUI state management.

/// A popup drawn over the current screen.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Overlay {
    #[default]
    None,
    Help,
}
