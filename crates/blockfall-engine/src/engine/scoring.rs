use std::fmt;

/// Base scores per cleared line count, multiplied by the level.
const LINE_CLEAR_SCORES: [u64; 5] = [0, 100, 300, 500, 800];
/// Base scores for spins, indexed by cleared line count.
const SPIN_SCORES: [u64; 4] = [400, 800, 1200, 1600];
/// Bonus per combo step, multiplied by the level and the combo count.
const COMBO_SCORE: u64 = 50;
/// Baseline lines required to finish a level; the level number is
/// added on top.
const LEVEL_LINES_BASE: u32 = 4;

/// How a placement cleared lines, for scoring and announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearKind {
    Single,
    Double,
    Triple,
    Tetris,
    /// A rotation-finished T placement, with the number of lines it
    /// cleared (possibly zero).
    Spin(usize),
}

impl ClearKind {
    /// Whether this clear keeps a back-to-back chain alive.
    #[must_use]
    fn is_difficult(self) -> bool {
        match self {
            Self::Single | Self::Double | Self::Triple => false,
            Self::Tetris => true,
            Self::Spin(lines) => lines > 0,
        }
    }
}

impl fmt::Display for ClearKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "SINGLE"),
            Self::Double => write!(f, "DOUBLE"),
            Self::Triple => write!(f, "TRIPLE"),
            Self::Tetris => write!(f, "TETRIS"),
            Self::Spin(0) => write!(f, "T-SPIN"),
            Self::Spin(1) => write!(f, "T-SPIN SINGLE"),
            Self::Spin(2) => write!(f, "T-SPIN DOUBLE"),
            Self::Spin(_) => write!(f, "T-SPIN TRIPLE"),
        }
    }
}

/// Summary of a single scored placement, emitted so frontends can
/// announce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementEvent {
    pub clear: ClearKind,
    /// Points credited for this placement, combo included.
    pub points: u64,
    /// Combo count when it earned points, so `Some(1)` on the second
    /// clearing placement in a row.
    pub combo: Option<u32>,
    /// Whether the back-to-back multiplier applied.
    pub back_to_back: bool,
    /// Whether this placement finished a level.
    pub leveled_up: bool,
}

/// Score, level and line bookkeeping for one session.
#[derive(Debug, Clone)]
pub struct GameStats {
    score: u64,
    level: u32,
    lines_to_next: i32,
    combo: i32,
    back_to_back: bool,
    total_lines: usize,
    placed_pieces: usize,
    clear_counts: [usize; 5],
}

impl GameStats {
    #[must_use]
    pub fn new(start_level: u32) -> Self {
        let level = start_level.max(1);
        Self {
            score: 0,
            level,
            lines_to_next: lines_for_level(level),
            combo: -1,
            back_to_back: false,
            total_lines: 0,
            placed_pieces: 0,
            clear_counts: [0; 5],
        }
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    #[must_use]
    pub fn placed_pieces(&self) -> usize {
        self.placed_pieces
    }

    /// Current combo count, while one is running.
    #[must_use]
    pub fn combo(&self) -> Option<u32> {
        u32::try_from(self.combo).ok()
    }

    #[must_use]
    pub fn back_to_back(&self) -> bool {
        self.back_to_back
    }

    /// Lines still needed to reach the next level.
    #[must_use]
    pub fn lines_to_next_level(&self) -> u32 {
        u32::try_from(self.lines_to_next.max(0)).unwrap_or(0)
    }

    /// How many times `lines` lines were cleared at once, for
    /// `lines` in `1..=4`.
    #[must_use]
    pub fn clear_count(&self, lines: usize) -> usize {
        self.clear_counts[lines]
    }

    /// Credits rows travelled by a drop.
    pub fn award_drop(&mut self, rows: u32, bonus_per_row: u64) {
        self.score += u64::from(rows) * bonus_per_row;
    }

    /// Scores one locked placement. `lines` is the number of rows the
    /// lock removed and `spin` marks a rotation-finished T placement.
    ///
    /// Returns `None` for a plain placement that earned nothing.
    pub fn apply_placement(&mut self, lines: usize, spin: bool) -> Option<PlacementEvent> {
        self.placed_pieces += 1;
        self.total_lines += lines;
        if (1..self.clear_counts.len()).contains(&lines) {
            self.clear_counts[lines] += 1;
        }

        let level = u64::from(self.level);
        if lines == 0 {
            self.combo = -1;
            if !spin {
                return None;
            }
            // A lineless spin scores but neither feeds nor breaks a
            // back-to-back chain.
            let points = SPIN_SCORES[0] * level;
            self.score += points;
            return Some(PlacementEvent {
                clear: ClearKind::Spin(0),
                points,
                combo: None,
                back_to_back: false,
                leveled_up: false,
            });
        }

        let clear = if spin {
            ClearKind::Spin(lines)
        } else {
            match lines {
                1 => ClearKind::Single,
                2 => ClearKind::Double,
                3 => ClearKind::Triple,
                _ => ClearKind::Tetris,
            }
        };

        self.combo += 1;
        let mut points = 0;
        let combo = u32::try_from(self.combo).ok().filter(|&count| count > 0);
        if let Some(count) = combo {
            points += COMBO_SCORE * level * u64::from(count);
        }

        let base = if spin {
            SPIN_SCORES[lines.min(3)]
        } else {
            LINE_CLEAR_SCORES[lines.min(4)]
        };
        let chained = clear.is_difficult() && self.back_to_back;
        let mut clear_points = base * level;
        if chained {
            clear_points = clear_points * 3 / 2;
        }
        points += clear_points;
        self.back_to_back = clear.is_difficult();
        self.score += points;

        let lines = i32::try_from(lines).unwrap_or(i32::MAX);
        self.lines_to_next -= lines;
        let mut leveled_up = false;
        if self.lines_to_next <= 0 {
            // Overshoot carries into the next level.
            self.level += 1;
            self.lines_to_next += lines_for_level(self.level);
            leveled_up = true;
        }

        Some(PlacementEvent {
            clear,
            points,
            combo,
            back_to_back: chained,
            leveled_up,
        })
    }
}

fn lines_for_level(level: u32) -> i32 {
    i32::try_from(LEVEL_LINES_BASE + level).unwrap_or(i32::MAX)
}
