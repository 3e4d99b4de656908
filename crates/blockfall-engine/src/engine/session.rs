use derive_more::IsVariant;

use crate::{
    core::{Piece, PieceAction, PieceKind, Playfield},
    engine::{
        bag::{Bag, PieceSeed},
        config::GameConfig,
        scoring::{GameStats, PlacementEvent},
    },
};

/// Lifecycle of a session. Gravity, autoshift and piece input only run
/// while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
}

/// Held direction keys driving autoshift. Frontends that can observe
/// key releases feed these through [`GameSession::press_left`] and
/// friends; others call the one-shot moves per key event instead.
#[derive(Debug, Clone, Copy, Default)]
struct HeldKeys {
    left: bool,
    right: bool,
    soft_drop: bool,
    shift_timer: u32,
    drop_timer: u32,
}

/// One game in progress: a falling piece over a field, plus the timing
/// state that decides when the piece falls and locks.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    bag: Bag,
    field: Playfield,
    current: Piece,
    held: Option<PieceKind>,
    state: SessionState,
    stats: GameStats,
    gravity_countdown: u32,
    /// Remaining lock delay while the piece sits on its support.
    lock_countdown: Option<u32>,
    rotation_budget: u32,
    holds_used: u32,
    keys: HeldKeys,
    pending_event: Option<PlacementEvent>,
}

impl GameSession {
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let bag = Bag::new();
        Self::with_bag(config, bag)
    }

    #[must_use]
    pub fn with_seed(config: GameConfig, seed: PieceSeed) -> Self {
        Self::with_bag(config, Bag::with_seed(seed))
    }

    fn with_bag(config: GameConfig, mut bag: Bag) -> Self {
        let stats = GameStats::new(config.start_level);
        let current = Piece::spawn(bag.draw_next());
        let mut session = Self {
            config,
            bag,
            field: Playfield::new(),
            current,
            held: None,
            state: SessionState::Playing,
            stats,
            gravity_countdown: 0,
            lock_countdown: None,
            rotation_budget: 0,
            holds_used: 0,
            keys: HeldKeys::default(),
            pending_event: None,
        };
        session.reset_piece_timers();
        session
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn field(&self) -> &Playfield {
        &self.field
    }

    #[must_use]
    pub fn current_piece(&self) -> &Piece {
        &self.current
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.held
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.bag.seed()
    }

    /// Upcoming pieces in draw order.
    pub fn next_pieces(&self, count: usize) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.preview(count)
    }

    /// Where the current piece would land, when the ghost is enabled.
    #[must_use]
    pub fn ghost_cells(&self) -> Option<[(i16, i16); 4]> {
        self.config
            .ghost
            .then(|| self.current.ghost_cells(&self.field))
    }

    /// Takes the announcement produced by the most recent lock, if any.
    pub fn take_event(&mut self) -> Option<PlacementEvent> {
        self.pending_event.take()
    }

    /// Advances the session by one tick: autoshift, then gravity, then
    /// the lock countdown. Does nothing unless playing.
    pub fn tick(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        self.step_autoshift();
        if !self.state.is_playing() {
            return;
        }

        self.gravity_countdown = self.gravity_countdown.saturating_sub(1);
        if self.gravity_countdown == 0 {
            self.gravity_countdown = self.gravity_interval();
            if self.current.try_drop(&self.field) {
                self.lock_countdown = None;
            } else if self.lock_countdown.is_none() {
                self.lock_countdown = Some(self.config.lock_delay);
            }
        }

        if let Some(remaining) = &mut self.lock_countdown {
            *remaining = remaining.saturating_sub(1);
        }
        if self.lock_countdown == Some(0) {
            // A shift or kick can leave the piece hanging over empty
            // cells. Such a piece falls again rather than locking in
            // the air.
            if self.current.is_grounded(&self.field) {
                self.lock_current_piece();
            } else {
                self.lock_countdown = None;
            }
        }
    }

    pub fn shift_left(&mut self) -> bool {
        self.shift(-1)
    }

    pub fn shift_right(&mut self) -> bool {
        self.shift(1)
    }

    fn shift(&mut self, dx: i16) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let moved = self.current.try_shift(&self.field, dx);
        if moved {
            self.refresh_lock_countdown();
        }
        moved
    }

    pub fn rotate_cw(&mut self) -> bool {
        self.rotate(Piece::try_rotate_cw)
    }

    pub fn rotate_ccw(&mut self) -> bool {
        self.rotate(Piece::try_rotate_ccw)
    }

    fn rotate(&mut self, op: fn(&mut Piece, &Playfield) -> bool) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let rotated = op(&mut self.current, &self.field);
        if rotated && self.lock_countdown.is_some() {
            if self.config.infinite_resets {
                self.lock_countdown = Some(self.config.lock_delay);
            } else if self.rotation_budget > 0 {
                self.rotation_budget -= 1;
                self.lock_countdown = Some(self.config.lock_delay);
            }
        }
        rotated
    }

    /// Moves the piece down one row and pays the soft drop bonus.
    pub fn soft_drop(&mut self) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        let dropped = self.current.try_drop(&self.field);
        if dropped {
            self.stats.award_drop(1, self.config.soft_drop_bonus);
            self.lock_countdown = None;
        }
        dropped
    }

    /// Sends the piece to the floor and locks it immediately.
    pub fn hard_drop(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        let rows = self.current.drop_to_floor(&self.field);
        self.stats.award_drop(rows, self.config.hard_drop_bonus);
        self.lock_current_piece();
    }

    /// Swaps the current piece with the held one, or stashes it and
    /// deals a fresh piece. Limited per placement by the config.
    pub fn hold(&mut self) -> bool {
        if !self.state.is_playing() || self.holds_used >= self.config.hold_limit {
            return false;
        }
        self.holds_used += 1;
        let stashed = self.current.kind();
        let next = match self.held.replace(stashed) {
            Some(kind) => kind,
            None => self.bag.draw_next(),
        };
        self.current = Piece::spawn(next);
        self.reset_piece_timers();
        true
    }

    pub fn press_left(&mut self) {
        self.keys.left = true;
        self.keys.shift_timer = 0;
        let _ = self.shift_left();
    }

    pub fn release_left(&mut self) {
        self.keys.left = false;
    }

    pub fn press_right(&mut self) {
        self.keys.right = true;
        self.keys.shift_timer = 0;
        let _ = self.shift_right();
    }

    pub fn release_right(&mut self) {
        self.keys.right = false;
    }

    pub fn press_soft_drop(&mut self) {
        self.keys.soft_drop = true;
        self.keys.drop_timer = 0;
        let _ = self.soft_drop();
    }

    pub fn release_soft_drop(&mut self) {
        self.keys.soft_drop = false;
    }

    /// Toggles between playing and paused. A finished session stays
    /// finished.
    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            SessionState::Playing => SessionState::Paused,
            SessionState::Paused => SessionState::Playing,
            SessionState::GameOver => SessionState::GameOver,
        };
    }

    /// Starts over with an empty field and a freshly seeded bag.
    pub fn restart(&mut self) {
        *self = Self::new(self.config.clone());
    }

    fn gravity_interval(&self) -> u32 {
        let level = self.stats.level().saturating_sub(1);
        self.config
            .gravity_base
            .saturating_sub(level.saturating_mul(self.config.gravity_step))
            .max(1)
    }

    /// Held keys repeat after a delay, like keyboard autorepeat but at
    /// game speed.
    fn step_autoshift(&mut self) {
        // Opposite directions cancel out.
        if self.keys.left != self.keys.right {
            self.keys.shift_timer += 1;
            if self.keys.shift_timer >= self.config.autoshift_delay {
                self.keys.shift_timer = self
                    .keys
                    .shift_timer
                    .saturating_sub(self.config.autoshift_repeat);
                if self.keys.left {
                    let _ = self.shift_left();
                } else {
                    let _ = self.shift_right();
                }
            }
        } else {
            self.keys.shift_timer = 0;
        }
        if self.keys.soft_drop {
            self.keys.drop_timer += 1;
            if self.keys.drop_timer >= self.config.autoshift_delay {
                self.keys.drop_timer = self
                    .keys
                    .drop_timer
                    .saturating_sub(self.config.soft_drop_repeat);
                let _ = self.soft_drop();
            }
        } else {
            self.keys.drop_timer = 0;
        }
    }

    /// A successful shift while grounded refills the lock delay.
    /// Rotations go through the budget in `rotate` instead.
    fn refresh_lock_countdown(&mut self) {
        if self.lock_countdown.is_some() {
            self.lock_countdown = Some(self.config.lock_delay);
        }
    }

    fn lock_current_piece(&mut self) {
        let spin = self.current.kind() == PieceKind::T
            && self.current.last_action() == Some(PieceAction::Rotate)
            && self.current.spin_corners_filled(&self.field);
        let lines = self.field.commit(self.current.cells(), self.current.kind());
        self.pending_event = self.stats.apply_placement(lines, spin);
        self.holds_used = 0;
        if self.field.is_topped_out() {
            self.state = SessionState::GameOver;
            return;
        }
        self.current = Piece::spawn(self.bag.draw_next());
        self.reset_piece_timers();
    }

    fn reset_piece_timers(&mut self) {
        self.gravity_countdown = self.gravity_interval();
        self.lock_countdown = None;
        self.rotation_budget = self.config.rotation_budget;
    }

    #[cfg(test)]
    fn set_field(&mut self, field: Playfield) {
        self.field = field;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scoring::ClearKind;

    const SEED: PieceSeed = PieceSeed::from_bytes([7; 16]);

    fn session() -> GameSession {
        GameSession::with_seed(GameConfig::default(), SEED)
    }

    fn session_with(config: GameConfig) -> GameSession {
        GameSession::with_seed(config, SEED)
    }

    /// Ticks until the current piece has been replaced by the next one.
    fn tick_until_lock(session: &mut GameSession) {
        let before = session.stats().placed_pieces();
        for _ in 0..10_000 {
            session.tick();
            if session.stats().placed_pieces() > before || session.state().is_game_over() {
                return;
            }
        }
        panic!("piece never locked");
    }

    #[test]
    fn spawn_uses_the_seeded_bag() {
        let mut a = session();
        let b = session();
        assert_eq!(a.current_piece().kind(), b.current_piece().kind());
        let preview = a.next_pieces(3).collect::<Vec<_>>();
        a.hard_drop();
        assert_eq!(a.current_piece().kind(), preview[0]);
        assert_eq!(a.next_pieces(2).collect::<Vec<_>>(), preview[1..]);
    }

    #[test]
    fn gravity_moves_the_piece_down() {
        let mut session = session();
        let start = session.current_piece().cells();
        for _ in 0..60 {
            session.tick();
        }
        let after = session.current_piece().cells();
        for ((x0, y0), (x1, y1)) in start.into_iter().zip(after) {
            assert_eq!(x0, x1);
            assert_eq!(y0 - 1, y1);
        }
    }

    #[test]
    fn gravity_speeds_up_with_level() {
        let config = GameConfig {
            start_level: 11,
            ..GameConfig::default()
        };
        let mut session = session_with(config);
        // Level 11: interval 60 - 10 * 3 = 30 ticks.
        let start = session.current_piece().cells();
        for _ in 0..30 {
            session.tick();
        }
        assert_eq!(session.current_piece().cells()[0].1, start[0].1 - 1);
    }

    #[test]
    fn gravity_interval_never_reaches_zero() {
        let config = GameConfig {
            start_level: 100,
            ..GameConfig::default()
        };
        let mut session = session_with(config);
        let start = session.current_piece().cells();
        session.tick();
        assert_eq!(session.current_piece().cells()[0].1, start[0].1 - 1);
    }

    #[test]
    fn hard_drop_locks_immediately() {
        let mut session = session();
        session.hard_drop();
        assert_eq!(session.stats().placed_pieces(), 1);
        // Hard drop from the spawn rows pays 2 points per row.
        assert!(session.stats().score() >= 2 * 18);
    }

    #[test]
    fn soft_drop_pays_per_row() {
        let mut session = session();
        assert!(session.soft_drop());
        assert!(session.soft_drop());
        assert_eq!(session.stats().score(), 2);
    }

    #[test]
    fn grounded_piece_locks_after_the_delay() {
        let mut session = session();
        while session.soft_drop() {}
        // One gravity attempt fails and arms the delay, then the
        // countdown runs out.
        for _ in 0..session.config().gravity_base + session.config().lock_delay {
            session.tick();
        }
        assert_eq!(session.stats().placed_pieces(), 1);
    }

    #[test]
    fn shifting_resets_the_lock_delay() {
        let mut session = session();
        while session.soft_drop() {}
        // Arm the lock delay.
        for _ in 0..session.config().gravity_base {
            session.tick();
        }
        assert_eq!(session.stats().placed_pieces(), 0);
        // Keep wiggling before the countdown expires; the piece stays
        // alive well past the plain delay.
        for _ in 0..10 {
            for _ in 0..session.config().lock_delay - 2 {
                session.tick();
            }
            assert!(session.shift_left() || session.shift_right());
            assert_eq!(session.stats().placed_pieces(), 0);
        }
        tick_until_lock(&mut session);
    }

    #[test]
    fn sliding_off_a_ledge_cancels_the_lock() {
        let mut session = session();
        while session.current_piece().kind() != PieceKind::O {
            session.hard_drop();
            session.set_field(Playfield::new());
        }
        // A one-cell pedestal under the left half of the piece.
        session.set_field(Playfield::from_ascii("....#....."));
        let placed = session.stats().placed_pieces();
        while session.soft_drop() {}
        for _ in 0..session.config().gravity_base {
            session.tick();
        }
        assert_eq!(session.stats().placed_pieces(), placed);
        // Two shifts leave the piece hanging over empty floor.
        assert!(session.shift_right());
        assert!(session.shift_right());
        for _ in 0..session.config().lock_delay + 1 {
            session.tick();
        }
        // The countdown ran out in the air, so nothing locked and the
        // piece is still a row above the floor.
        assert_eq!(session.stats().placed_pieces(), placed);
        let bottom = session
            .current_piece()
            .cells()
            .into_iter()
            .map(|(_, y)| y)
            .min()
            .unwrap();
        assert_eq!(bottom, 1);
        tick_until_lock(&mut session);
        assert_eq!(session.field().cell(6, 0), Some(PieceKind::O));
        assert_eq!(session.field().cell(7, 0), Some(PieceKind::O));
        assert!(session.field().cell(6, 2).is_none());
    }

    #[test]
    fn rotation_resets_run_out() {
        let config = GameConfig {
            rotation_budget: 2,
            gravity_base: 100,
            ..GameConfig::default()
        };
        let mut session = session_with(config);
        if session.current_piece().kind() == PieceKind::O {
            session.hard_drop();
            session.set_field(Playfield::new());
        }
        while session.soft_drop() {}
        for _ in 0..session.config().gravity_base {
            session.tick();
        }
        // Two rotations refill the countdown, the third does not.
        let delay = session.config().lock_delay;
        for _ in 0..2 {
            for _ in 0..delay - 2 {
                session.tick();
            }
            assert!(session.rotate_cw());
            assert_eq!(session.stats().placed_pieces(), 0);
        }
        for _ in 0..delay - 1 {
            session.tick();
        }
        let _ = session.rotate_cw();
        session.tick();
        assert_eq!(session.stats().placed_pieces(), 1);
    }

    #[test]
    fn infinite_resets_ignore_the_budget() {
        let config = GameConfig {
            rotation_budget: 0,
            infinite_resets: true,
            ..GameConfig::default()
        };
        let mut session = session_with(config);
        if session.current_piece().kind() == PieceKind::O {
            session.hard_drop();
            session.set_field(Playfield::new());
        }
        while session.soft_drop() {}
        for _ in 0..session.config().gravity_base {
            session.tick();
        }
        let delay = session.config().lock_delay;
        for _ in 0..20 {
            for _ in 0..delay - 2 {
                session.tick();
            }
            assert!(session.rotate_cw());
            assert_eq!(session.stats().placed_pieces(), 0);
        }
    }

    #[test]
    fn hold_swaps_and_is_limited() {
        let mut session = session();
        let first = session.current_piece().kind();
        let second = session.next_pieces(1).next().unwrap();
        assert!(session.hold());
        assert_eq!(session.held_piece(), Some(first));
        assert_eq!(session.current_piece().kind(), second);
        // Second hold swaps back.
        assert!(session.hold());
        assert_eq!(session.current_piece().kind(), first);
        assert_eq!(session.held_piece(), Some(second));
        // The default limit is two per placement.
        assert!(!session.hold());
        session.hard_drop();
        assert!(session.hold());
    }

    #[test]
    fn autoshift_repeats_a_held_direction() {
        let mut session = session();
        let x_before = session.current_piece().cells()[0].0;
        session.press_left();
        assert_eq!(session.current_piece().cells()[0].0, x_before - 1);
        // Delay of 10 ticks, then one shift every 3.
        for _ in 0..session.config().autoshift_delay {
            session.tick();
        }
        let x_after = session.current_piece().cells()[0].0;
        assert!(x_after < x_before - 1);
        session.release_left();
        let resting = session.current_piece().cells()[0].0;
        for _ in 0..3 {
            session.tick();
        }
        assert_eq!(session.current_piece().cells()[0].0, resting);
    }

    #[test]
    fn repeat_intervals_may_exceed_the_delay() {
        let config = GameConfig {
            autoshift_delay: 2,
            autoshift_repeat: 5,
            soft_drop_repeat: 5,
            ..GameConfig::default()
        };
        let mut session = session_with(config);
        let x_before = session.current_piece().cells()[0].0;
        session.press_left();
        session.press_soft_drop();
        // The timers restart from zero after each repeat rather than
        // going negative.
        for _ in 0..10 {
            session.tick();
        }
        assert!(session.current_piece().cells()[0].0 < x_before - 1);
    }

    #[test]
    fn opposite_directions_cancel() {
        let mut session = session();
        session.press_left();
        session.press_right();
        let x = session.current_piece().cells()[0].0;
        for _ in 0..30 {
            session.tick();
        }
        assert_eq!(session.current_piece().cells()[0].0, x);
    }

    #[test]
    fn pause_freezes_everything() {
        let mut session = session();
        session.toggle_pause();
        assert!(session.state().is_paused());
        let cells = session.current_piece().cells();
        for _ in 0..600 {
            session.tick();
        }
        assert!(!session.shift_left());
        assert!(!session.rotate_cw());
        assert!(!session.soft_drop());
        assert!(!session.hold());
        session.hard_drop();
        assert_eq!(session.current_piece().cells(), cells);
        assert_eq!(session.stats().placed_pieces(), 0);
        session.toggle_pause();
        assert!(session.state().is_playing());
    }

    #[test]
    fn stacking_into_the_buffer_ends_the_session() {
        let mut session = session();
        for _ in 0..10_000 {
            session.hard_drop();
            if session.state().is_game_over() {
                break;
            }
        }
        assert!(session.state().is_game_over());
        assert!(session.field().is_topped_out());
        // A dead session ignores input, including pause.
        session.toggle_pause();
        assert!(session.state().is_game_over());
        let placed = session.stats().placed_pieces();
        session.hard_drop();
        assert_eq!(session.stats().placed_pieces(), placed);
    }

    #[test]
    fn restart_clears_the_board() {
        let mut session = session();
        for _ in 0..50 {
            session.hard_drop();
            if session.state().is_game_over() {
                break;
            }
        }
        session.restart();
        assert!(session.state().is_playing());
        assert_eq!(session.stats().score(), 0);
        assert_eq!(session.stats().placed_pieces(), 0);
        assert!(!session.field().is_topped_out());
        assert!(session.held_piece().is_none());
    }

    #[test]
    fn ghost_can_be_disabled() {
        let config = GameConfig {
            ghost: false,
            ..GameConfig::default()
        };
        let session = session_with(config);
        assert!(session.ghost_cells().is_none());
        let session = GameSession::with_seed(GameConfig::default(), SEED);
        let ghost = session.ghost_cells().unwrap();
        let piece_x = session.current_piece().cells().map(|(x, _)| x);
        assert_eq!(ghost.map(|(x, _)| x), piece_x);
    }

    #[test]
    fn clearing_a_line_raises_an_event() {
        let mut session = session();
        // Fill the floor row except under the current piece's bottom
        // cells, so a straight hard drop completes the row.
        let gap: &[i16] = match session.current_piece().kind() {
            PieceKind::I => &[3, 4, 5, 6],
            PieceKind::O => &[4, 5],
            PieceKind::S => &[3, 4],
            PieceKind::Z => &[4, 5],
            PieceKind::J | PieceKind::L | PieceKind::T => &[3, 4, 5],
        };
        let row = (0..10)
            .map(|x| if gap.contains(&x) { '.' } else { '#' })
            .collect::<String>();
        session.set_field(Playfield::from_ascii(&row));
        session.hard_drop();
        assert_eq!(session.stats().total_lines(), 1);
        let event = session.take_event().expect("no event for the clear");
        assert!(event.points >= 100);
        // The event is consumed on take.
        assert!(session.take_event().is_none());
    }

    #[test]
    fn rotated_t_in_a_slot_counts_as_a_spin() {
        let mut session = session();
        while session.current_piece().kind() != PieceKind::T {
            session.hard_drop();
            session.set_field(Playfield::new());
            assert!(session.take_event().is_none());
        }
        // A vertical T on the left wall with one stack cell beside it
        // has three filled corners.
        session.set_field(Playfield::from_ascii(".#........"));
        assert!(session.rotate_cw());
        while session.shift_left() {}
        while session.soft_drop() {}
        // Rotating away and back keeps the slot position while making
        // the final action a rotation.
        assert!(session.rotate_ccw());
        assert!(session.rotate_cw());
        tick_until_lock(&mut session);
        let event = session.take_event().expect("no spin event");
        assert_eq!(event.clear, ClearKind::Spin(0));
        assert_eq!(event.points, 400);
    }
}
