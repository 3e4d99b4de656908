use std::path::PathBuf;

use anyhow::Context as _;
use blockfall_engine::{GameConfig, GameSession, PieceSeed, PlacementEvent, SessionState};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Style},
    text::Text,
};

use crate::{
    score_file,
    tui::{App, Tui},
    view::widgets::SessionDisplay,
};

const FPS: f64 = 60.0;
/// Ticks a placement announcement stays on screen.
const ANNOUNCEMENT_TICKS: u32 = 90;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Piece sequence seed, 32 hex digits. Random when omitted
    #[clap(long)]
    seed: Option<PieceSeed>,
    /// Hide the landing preview
    #[clap(long)]
    no_ghost: bool,
    /// Let rotations reset the lock delay without limit
    #[clap(long)]
    infinity: bool,
    /// Starting level
    #[clap(long, default_value_t = 1)]
    level: u32,
    /// File the best score is kept in
    #[clap(long, default_value = "high_score.txt")]
    high_score_file: PathBuf,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let config = GameConfig {
        ghost: !arg.no_ghost,
        infinite_resets: arg.infinity,
        start_level: arg.level,
        ..GameConfig::default()
    };
    let high_score = score_file::load(&arg.high_score_file)?;
    // Key release reporting needs terminal support; without it held
    // keys are handled per repeat event instead.
    let track_releases = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);

    let mut app = PlayApp::new(config, arg.seed, high_score, track_releases);
    Tui::new().run(&mut app)?;

    score_file::store_if_higher(&arg.high_score_file, app.final_score())
        .with_context(|| format!("failed to update {}", arg.high_score_file.display()))?;
    Ok(())
}

#[derive(Debug)]
struct PlayApp {
    screen: PlayScreen,
}

impl PlayApp {
    fn new(config: GameConfig, seed: Option<PieceSeed>, high_score: u64, track_releases: bool) -> Self {
        Self {
            screen: PlayScreen::new(config, seed, high_score, track_releases),
        }
    }

    fn final_score(&self) -> u64 {
        self.screen.best_score()
    }
}

impl App for PlayApp {
    fn init(&mut self, tui: &mut Tui) {
        tui.set_tick_rate(FPS);
        tui.report_key_releases(self.screen.track_releases);
    }

    fn should_exit(&self) -> bool {
        self.screen.is_exiting
    }

    fn handle_event(&mut self, _tui: &mut Tui, event: &Event) {
        self.screen.handle_event(event);
    }

    fn draw(&self, frame: &mut Frame) {
        self.screen.draw(frame);
    }

    fn update(&mut self, _tui: &mut Tui) {
        self.screen.update();
    }
}

#[derive(Debug)]
struct PlayScreen {
    session: GameSession,
    high_score: u64,
    /// Best score across restarts within this run.
    session_best: u64,
    announcement: Option<(String, u32)>,
    track_releases: bool,
    is_exiting: bool,
}

impl PlayScreen {
    fn new(config: GameConfig, seed: Option<PieceSeed>, high_score: u64, track_releases: bool) -> Self {
        let session = match seed {
            Some(seed) => GameSession::with_seed(config, seed),
            None => GameSession::new(config),
        };
        Self {
            session,
            high_score,
            session_best: 0,
            announcement: None,
            track_releases,
            is_exiting: false,
        }
    }

    fn best_score(&self) -> u64 {
        self.session_best.max(self.session.stats().score())
    }

    fn restart(&mut self) {
        self.session_best = self.best_score();
        self.announcement = None;
        self.session.restart();
    }

    fn update(&mut self) {
        self.session.tick();
        if let Some(event) = self.session.take_event() {
            self.announcement = Some((announcement_text(&event), ANNOUNCEMENT_TICKS));
        } else if let Some((_, ticks)) = &mut self.announcement {
            *ticks -= 1;
            if *ticks == 0 {
                self.announcement = None;
            }
        }
    }

    fn handle_event(&mut self, event: &Event) {
        if let Some(key) = event.as_key_event() {
            self.handle_key(key);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            if self.track_releases {
                match key.code {
                    KeyCode::Left => self.session.release_left(),
                    KeyCode::Right => self.session.release_right(),
                    KeyCode::Down => self.session.release_soft_drop(),
                    _ => {}
                }
            }
            return;
        }
        let repeat = key.kind == KeyEventKind::Repeat;
        match key.code {
            // With release reporting, holding a key is handled by the
            // session's autoshift; repeat events would double up.
            KeyCode::Left if self.track_releases => {
                if !repeat {
                    self.session.press_left();
                }
            }
            KeyCode::Right if self.track_releases => {
                if !repeat {
                    self.session.press_right();
                }
            }
            KeyCode::Down if self.track_releases => {
                if !repeat {
                    self.session.press_soft_drop();
                }
            }
            KeyCode::Left => _ = self.session.shift_left(),
            KeyCode::Right => _ = self.session.shift_right(),
            KeyCode::Down => _ = self.session.soft_drop(),
            KeyCode::Up | KeyCode::Char('x') => _ = self.session.rotate_cw(),
            KeyCode::Char('z') => _ = self.session.rotate_ccw(),
            KeyCode::Char(' ') if !repeat => self.session.hard_drop(),
            KeyCode::Char('c') if !repeat => _ = self.session.hold(),
            KeyCode::Char('p') | KeyCode::Esc if !repeat => self.session.toggle_pause(),
            KeyCode::Char('r') if !repeat => self.restart(),
            KeyCode::Char('q') => self.is_exiting = true,
            _ => {}
        }
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let session_display = SessionDisplay::new(&self.session)
            .high_score(self.high_score.max(self.best_score()))
            .announcement(self.announcement.as_ref().map(|(text, _)| text.as_str()));
        let help_text = match self.session.state() {
            SessionState::Playing => {
                "← → (Move) | ↓ (Soft Drop) | Space (Hard Drop) | ↑ X Z (Rotate) | C (Hold) | P (Pause) | Q (Quit)"
            }
            SessionState::Paused => "P (Resume) | R (Restart) | Q (Quit)",
            SessionState::GameOver => "R (Restart) | Q (Quit)",
        };
        let help_text = Text::from(help_text)
            .style(Style::default().fg(Color::DarkGray))
            .centered();

        let [main_area, help_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)])
                .areas::<2>(frame.area());
        frame.render_widget(session_display, main_area);
        frame.render_widget(help_text, help_area);
    }
}

fn announcement_text(event: &PlacementEvent) -> String {
    let mut text = String::new();
    if event.back_to_back {
        text.push_str("B2B ");
    }
    text.push_str(&event.clear.to_string());
    if let Some(combo) = event.combo.filter(|&combo| combo > 0) {
        text.push_str(&format!(" COMBO x{combo}"));
    }
    text.push_str(&format!(" +{}", event.points));
    text
}
