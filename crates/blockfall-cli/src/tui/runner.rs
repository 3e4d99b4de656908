use std::{io, time::Duration};

use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
};

use crate::tui::{App, event::TuiEvent, event_loop::EventLoop};

/// Owns the terminal event loop and runs an [`App`] against it.
#[derive(Debug)]
pub struct Tui {
    events: EventLoop,
    report_key_releases: bool,
}

impl Default for Tui {
    fn default() -> Self {
        Self::new()
    }
}

impl Tui {
    pub fn new() -> Self {
        Self {
            events: EventLoop::new(),
            report_key_releases: false,
        }
    }

    /// Sets the tick rate in ticks per second.
    pub fn set_tick_rate(&mut self, rate: f64) {
        self.events
            .set_tick_interval(Some(Duration::from_secs_f64(1.0 / rate)));
    }

    /// Asks the terminal to report key releases and repeats. Only
    /// effective on terminals with the keyboard enhancement protocol.
    pub fn report_key_releases(&mut self, enabled: bool) {
        self.report_key_releases = enabled;
    }

    /// Runs `app` until [`App::should_exit`] returns true.
    pub fn run<A>(mut self, app: &mut A) -> anyhow::Result<()>
    where
        A: App,
    {
        app.init(&mut self);

        let enhanced_keys = self.report_key_releases;
        let result = ratatui::run(|terminal| {
            if enhanced_keys {
                execute!(
                    io::stdout(),
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
                )?;
            }
            while !app.should_exit() {
                match self.events.next()? {
                    TuiEvent::Tick => app.update(&mut self),
                    TuiEvent::Render => {
                        terminal.draw(|frame| app.draw(frame))?;
                    }
                    TuiEvent::Crossterm(event) => app.handle_event(&mut self, &event),
                }
            }
            Ok(())
        });
        if enhanced_keys {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        result
    }
}
