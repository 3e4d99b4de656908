use crossterm::event::Event;

/// What woke the event loop up.
#[derive(Debug)]
pub(super) enum TuiEvent {
    /// A tick interval elapsed.
    Tick,
    /// The screen should be redrawn.
    Render,
    /// The terminal delivered an event.
    Crossterm(Event),
}

impl From<Event> for TuiEvent {
    fn from(event: Event) -> Self {
        Self::Crossterm(event)
    }
}
