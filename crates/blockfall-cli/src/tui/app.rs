use crossterm::event::Event;
use ratatui::Frame;

use crate::tui::Tui;

/// A TUI application driven by [`Tui::run`].
pub trait App {
    /// Called once before the event loop starts. Configure the tick
    /// rate and key handling here.
    fn init(&mut self, tui: &mut Tui);

    /// When this returns true the event loop stops.
    fn should_exit(&self) -> bool;

    /// Handles a terminal event (key input, resize, ...).
    fn handle_event(&mut self, tui: &mut Tui, event: &Event);

    /// Draws the screen. Called after every state change.
    fn draw(&self, frame: &mut Frame);

    /// Advances application state. Called once per tick.
    fn update(&mut self, tui: &mut Tui);
}
