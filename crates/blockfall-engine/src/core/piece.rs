use serde::{Deserialize, Serialize};

use crate::core::board::Playfield;

/// Kind of tetromino.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    S,
    Z,
    J,
    L,
    T,
}

impl PieceKind {
    /// The number of piece kinds.
    pub const LEN: usize = 7;
    /// All piece kinds, in a fixed order.
    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::O,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
        Self::T,
    ];

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::I => 'I',
            Self::O => 'O',
            Self::S => 'S',
            Self::Z => 'Z',
            Self::J => 'J',
            Self::L => 'L',
            Self::T => 'T',
        }
    }

    #[must_use]
    pub fn from_char(ch: char) -> Option<Self> {
        let kind = match ch {
            'I' => Self::I,
            'O' => Self::O,
            'S' => Self::S,
            'Z' => Self::Z,
            'J' => Self::J,
            'L' => Self::L,
            'T' => Self::T,
            _ => return None,
        };
        Some(kind)
    }

    /// Cell offsets of the spawn orientation, within a 4x2 box.
    ///
    /// Useful for drawing hold and next previews without placing a piece
    /// on a board.
    #[must_use]
    pub fn preview_cells(self) -> [(usize, usize); 4] {
        let cells = SHAPES[self as usize][0];
        cells.map(|(dx, dy)| (usize::from(dx.unsigned_abs()), usize::from(dy.unsigned_abs())))
    }

    fn kicks(self, from: Rotation, to: Rotation) -> [(i16, i16); 4] {
        let idx = kick_index(from, to);
        match self {
            Self::I => I_KICKS[idx],
            _ => COMMON_KICKS[idx],
        }
    }
}

/// Rotation state of a piece. `0` is the spawn orientation, increasing
/// clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rotation(u8);

impl Rotation {
    #[must_use]
    pub fn rotated_cw(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    #[must_use]
    pub fn rotated_ccw(self) -> Self {
        Self((self.0 + 3) % 4)
    }

    #[must_use]
    pub fn as_index(self) -> usize {
        usize::from(self.0)
    }
}

/// The last input that successfully changed a piece's position.
///
/// Spin detection at lock time only fires when the final action was a
/// rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceAction {
    Shift,
    Drop,
    Rotate,
}

/// Cell offsets per kind and rotation state, measured from the top-left
/// corner of the bounding box. `dx` grows rightward and `dy` grows
/// downward, so the absolute cell of `(dx, dy)` at corner `(cx, cy)` is
/// `(cx + dx, cy - dy)`.
#[rustfmt::skip]
const SHAPES: [[[(i16, i16); 4]; 4]; PieceKind::LEN] = [
    // I
    [
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(2, 0), (2, 1), (2, 2), (2, 3)],
        [(0, 2), (1, 2), (2, 2), (3, 2)],
        [(1, 0), (1, 1), (1, 2), (1, 3)],
    ],
    // O
    [
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
        [(1, 0), (2, 0), (1, 1), (2, 1)],
    ],
    // S
    [
        [(0, 1), (1, 0), (1, 1), (2, 0)],
        [(2, 2), (2, 1), (1, 1), (1, 0)],
        [(0, 2), (1, 2), (1, 1), (2, 1)],
        [(0, 0), (1, 1), (0, 1), (1, 2)],
    ],
    // Z
    [
        [(0, 0), (1, 0), (1, 1), (2, 1)],
        [(2, 0), (2, 1), (1, 1), (1, 2)],
        [(0, 1), (1, 2), (1, 1), (2, 2)],
        [(1, 0), (1, 1), (0, 1), (0, 2)],
    ],
    // J
    [
        [(0, 1), (0, 0), (1, 1), (2, 1)],
        [(1, 2), (2, 0), (1, 1), (1, 0)],
        [(0, 1), (2, 2), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (0, 2), (1, 2)],
    ],
    // L
    [
        [(0, 1), (2, 0), (1, 1), (2, 1)],
        [(1, 2), (2, 2), (1, 1), (1, 0)],
        [(0, 1), (0, 2), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (0, 0), (1, 2)],
    ],
    // T
    [
        [(0, 1), (1, 0), (1, 1), (2, 1)],
        [(1, 2), (2, 1), (1, 1), (1, 0)],
        [(0, 1), (1, 2), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (0, 1), (1, 2)],
    ],
];

fn kick_index(from: Rotation, to: Rotation) -> usize {
    let dir = usize::from(to != from.rotated_cw());
    from.as_index() * 2 + dir
}

/// Wall kick offsets for J, L, S, T and Z, indexed by `kick_index`.
/// Offsets are absolute board deltas: positive `dy` is upward.
#[rustfmt::skip]
const COMMON_KICKS: [[(i16, i16); 4]; 8] = [
    [(-1, 0), (-1, 1), (0, -2), (-1, -2)], // 0 -> 1
    [(1, 0), (1, 1), (0, -2), (1, -2)],    // 0 -> 3
    [(1, 0), (1, -1), (0, 2), (1, 2)],     // 1 -> 2
    [(1, 0), (1, -1), (0, 2), (1, 2)],     // 1 -> 0
    [(1, 0), (1, 1), (0, -2), (1, -2)],    // 2 -> 3
    [(-1, 0), (-1, 1), (0, -2), (-1, -2)], // 2 -> 1
    [(-1, 0), (-1, -1), (0, 2), (-1, 2)],  // 3 -> 0
    [(-1, 0), (-1, -1), (0, 2), (-1, 2)],  // 3 -> 2
];

/// Wall kick offsets for I, indexed by `kick_index`.
#[rustfmt::skip]
const I_KICKS: [[(i16, i16); 4]; 8] = [
    [(-2, 0), (1, 0), (-2, -1), (1, 2)],   // 0 -> 1
    [(-1, 0), (2, 0), (-1, 2), (2, -1)],   // 0 -> 3
    [(-1, 0), (2, 0), (-1, 2), (2, -1)],   // 1 -> 2
    [(2, 0), (-1, 0), (2, 1), (-1, -2)],   // 1 -> 0
    [(2, 0), (-1, 0), (2, 1), (-1, -2)],   // 2 -> 3
    [(1, 0), (-2, 0), (1, -2), (-2, 1)],   // 2 -> 1
    [(1, 0), (-2, 0), (1, -2), (-2, 1)],   // 3 -> 0
    [(-1, 0), (2, 0), (-1, 2), (2, -1)],   // 3 -> 2
];

/// Corner where new pieces appear, in board coordinates.
pub const SPAWN_CORNER: (i16, i16) = (3, 21);

/// A falling tetromino: a kind, a rotation state and the board position
/// of its bounding box corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    rotation: Rotation,
    corner: (i16, i16),
    last_action: Option<PieceAction>,
}

impl Piece {
    #[must_use]
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::default(),
            corner: SPAWN_CORNER,
            last_action: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub fn last_action(&self) -> Option<PieceAction> {
        self.last_action
    }

    /// Absolute board cells occupied by the piece.
    #[must_use]
    pub fn cells(&self) -> [(i16, i16); 4] {
        Self::cells_at(self.kind, self.rotation, self.corner)
    }

    fn cells_at(kind: PieceKind, rotation: Rotation, corner: (i16, i16)) -> [(i16, i16); 4] {
        let shape = SHAPES[kind as usize][rotation.as_index()];
        shape.map(|(dx, dy)| (corner.0 + dx, corner.1 - dy))
    }

    /// Moves the piece one column left or right. Returns `false` and
    /// leaves the piece untouched when any destination cell is blocked.
    pub fn try_shift(&mut self, field: &Playfield, dx: i16) -> bool {
        let corner = (self.corner.0 + dx, self.corner.1);
        let ok = Self::cells_at(self.kind, self.rotation, corner)
            .into_iter()
            .all(|(x, y)| field.is_clear(x, y));
        if ok {
            self.corner = corner;
            self.last_action = Some(PieceAction::Shift);
        }
        ok
    }

    /// Moves the piece one row down. Returns `false` and leaves the
    /// piece untouched when any destination cell is blocked.
    pub fn try_drop(&mut self, field: &Playfield) -> bool {
        let corner = (self.corner.0, self.corner.1 - 1);
        let ok = Self::cells_at(self.kind, self.rotation, corner)
            .into_iter()
            .all(|(x, y)| field.is_clear(x, y));
        if ok {
            self.corner = corner;
            self.last_action = Some(PieceAction::Drop);
        }
        ok
    }

    /// Whether a drop would be blocked by the stack or the floor.
    #[must_use]
    pub fn is_grounded(&self, field: &Playfield) -> bool {
        let below = (self.corner.0, self.corner.1 - 1);
        Self::cells_at(self.kind, self.rotation, below)
            .into_iter()
            .any(|(x, y)| !field.is_clear(x, y))
    }

    /// Drops the piece as far as it goes and returns the number of rows
    /// travelled.
    pub fn drop_to_floor(&mut self, field: &Playfield) -> u32 {
        let mut rows = 0;
        while self.try_drop(field) {
            rows += 1;
        }
        rows
    }

    pub fn try_rotate_cw(&mut self, field: &Playfield) -> bool {
        self.try_rotate(field, self.rotation.rotated_cw())
    }

    pub fn try_rotate_ccw(&mut self, field: &Playfield) -> bool {
        self.try_rotate(field, self.rotation.rotated_ccw())
    }

    fn try_rotate(&mut self, field: &Playfield, to: Rotation) -> bool {
        // O has a single shape, so rotating it is a no-op and never
        // counts as an action.
        if self.kind == PieceKind::O {
            return false;
        }
        let unshifted = (0, 0);
        let kicks = self.kind.kicks(self.rotation, to);
        for (dx, dy) in std::iter::once(unshifted).chain(kicks) {
            let corner = (self.corner.0 + dx, self.corner.1 + dy);
            let ok = Self::cells_at(self.kind, to, corner)
                .into_iter()
                .all(|(x, y)| field.is_clear(x, y));
            if ok {
                self.corner = corner;
                self.rotation = to;
                self.last_action = Some(PieceAction::Rotate);
                return true;
            }
        }
        false
    }

    /// Cells the piece would occupy after a drop to the floor, without
    /// moving the piece. This is the ghost outline.
    #[must_use]
    pub fn ghost_cells(&self, field: &Playfield) -> [(i16, i16); 4] {
        let mut corner = self.corner;
        loop {
            let below = (corner.0, corner.1 - 1);
            let ok = Self::cells_at(self.kind, self.rotation, below)
                .into_iter()
                .all(|(x, y)| field.is_clear(x, y));
            if !ok {
                break;
            }
            corner = below;
        }
        Self::cells_at(self.kind, self.rotation, corner)
    }

    /// T-spin corner test: at least three of the four corners of the
    /// piece's 3x3 box are occupied or out of bounds. Only meaningful
    /// for T pieces whose last action was a rotation.
    #[must_use]
    pub fn spin_corners_filled(&self, field: &Playfield) -> bool {
        let (cx, cy) = self.corner;
        let corners = [(cx, cy), (cx + 2, cy), (cx, cy - 2), (cx + 2, cy - 2)];
        let filled = corners
            .into_iter()
            .filter(|&(x, y)| !field.is_clear(x, y))
            .count();
        filled >= 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_round_trip() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(PieceKind::from_char('x'), None);
    }

    #[test]
    fn serde_as_name() {
        let json = serde_json::to_string(&PieceKind::T).unwrap();
        assert_eq!(json, r#""T""#);
        let kind: PieceKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, PieceKind::T);
    }

    #[test]
    fn four_rotations_return_to_spawn() {
        let field = Playfield::new();
        for kind in PieceKind::ALL {
            if kind == PieceKind::O {
                continue;
            }
            let spawned = Piece::spawn(kind);
            let mut piece = spawned.clone();
            for _ in 0..4 {
                assert!(piece.try_rotate_cw(&field), "{kind:?}");
            }
            assert_eq!(piece.cells(), spawned.cells(), "{kind:?}");
            assert_eq!(piece.rotation(), Rotation::default(), "{kind:?}");
        }
    }

    #[test]
    fn cw_then_ccw_cancel_out() {
        let field = Playfield::new();
        for kind in PieceKind::ALL {
            if kind == PieceKind::O {
                continue;
            }
            let spawned = Piece::spawn(kind);
            let mut piece = spawned.clone();
            assert!(piece.try_rotate_cw(&field));
            assert!(piece.try_rotate_ccw(&field));
            assert_eq!(piece.cells(), spawned.cells(), "{kind:?}");
        }
    }

    #[test]
    fn o_never_rotates() {
        let field = Playfield::new();
        let mut piece = Piece::spawn(PieceKind::O);
        assert!(!piece.try_rotate_cw(&field));
        assert!(!piece.try_rotate_ccw(&field));
        assert_eq!(piece.last_action(), None);
    }

    #[test]
    fn shift_stops_at_walls() {
        let field = Playfield::new();
        let mut piece = Piece::spawn(PieceKind::I);
        let mut shifts = 0;
        while piece.try_shift(&field, -1) {
            shifts += 1;
        }
        assert_eq!(shifts, 3);
        assert_eq!(piece.cells().map(|(x, _)| x), [0, 1, 2, 3]);

        let mut piece = Piece::spawn(PieceKind::I);
        let mut shifts = 0;
        while piece.try_shift(&field, 1) {
            shifts += 1;
        }
        assert_eq!(shifts, 3);
        assert_eq!(piece.cells().map(|(x, _)| x), [6, 7, 8, 9]);
    }

    #[test]
    fn i_rests_on_the_floor() {
        let field = Playfield::new();
        let mut piece = Piece::spawn(PieceKind::I);
        let rows = piece.drop_to_floor(&field);
        assert_eq!(rows, 20);
        assert_eq!(piece.cells().map(|(_, y)| y), [0, 0, 0, 0]);
        assert!(!piece.try_drop(&field));
    }

    #[test]
    fn drop_lands_on_stack() {
        let field = Playfield::from_ascii(
            "\
            ..........\n\
            #####.....\n\
            ",
        );
        let mut piece = Piece::spawn(PieceKind::O);
        piece.drop_to_floor(&field);
        // O occupies columns 4 and 5; column 4 rests on the stack.
        assert_eq!(piece.cells(), [(4, 2), (5, 2), (4, 1), (5, 1)]);
    }

    #[test]
    fn blocked_move_leaves_piece_untouched() {
        let field = Playfield::from_ascii(
            "\
            ..........\n\
            ..........\n\
            ",
        );
        let mut piece = Piece::spawn(PieceKind::T);
        piece.drop_to_floor(&field);
        let before = piece.clone();
        assert!(!piece.try_drop(&field));
        assert_eq!(piece, before);
    }

    #[test]
    fn wall_kick_off_left_wall() {
        let field = Playfield::new();
        let mut piece = Piece::spawn(PieceKind::T);
        // Vertical orientation hugging the left wall.
        assert!(piece.try_rotate_cw(&field));
        while piece.try_shift(&field, -1) {}
        let corner_x = piece.cells().into_iter().map(|(x, _)| x).min().unwrap();
        assert_eq!(corner_x, 0);
        // Rotating back would poke through the wall without a kick.
        assert!(piece.try_rotate_cw(&field));
        assert!(piece.cells().into_iter().all(|(x, _)| x >= 0));
    }

    #[test]
    fn rotation_fails_in_a_packed_slot() {
        // A one-wide well exactly fits a vertical I; no rotation target
        // or kick can free it.
        let field = Playfield::from_ascii(
            "\
            .#########\n\
            .#########\n\
            .#########\n\
            .#########\n\
            ",
        );
        let mut piece = Piece::spawn(PieceKind::I);
        assert!(piece.try_rotate_cw(&field));
        while piece.try_shift(&field, -1) {}
        piece.drop_to_floor(&field);
        let before = piece.clone();
        assert!(!piece.try_rotate_cw(&field));
        assert_eq!(piece, before);
    }

    #[test]
    fn ghost_matches_hard_drop_landing() {
        let field = Playfield::from_ascii(
            "\
            ...#......\n\
            ...##.....\n\
            ",
        );
        let piece = Piece::spawn(PieceKind::L);
        let ghost = piece.ghost_cells(&field);
        let mut dropped = piece.clone();
        dropped.drop_to_floor(&field);
        assert_eq!(ghost, dropped.cells());
    }

    #[test]
    fn spin_corners_require_three_filled() {
        // Vertical T against the left wall: two corners out of bounds
        // plus one stack cell makes three.
        let field = Playfield::from_ascii(
            "\
            .#........\n\
            ",
        );
        let mut piece = Piece::spawn(PieceKind::T);
        assert!(piece.try_rotate_cw(&field));
        while piece.try_shift(&field, -1) {}
        piece.drop_to_floor(&field);
        assert!(piece.spin_corners_filled(&field));

        let open = Playfield::new();
        let mut piece = Piece::spawn(PieceKind::T);
        piece.drop_to_floor(&open);
        // The floor counts as two filled corners, which is not enough.
        assert!(!piece.spin_corners_filled(&open));
    }

    #[test]
    fn last_action_tracks_moves() {
        let field = Playfield::new();
        let mut piece = Piece::spawn(PieceKind::J);
        assert_eq!(piece.last_action(), None);
        assert!(piece.try_shift(&field, 1));
        assert_eq!(piece.last_action(), Some(PieceAction::Shift));
        assert!(piece.try_rotate_cw(&field));
        assert_eq!(piece.last_action(), Some(PieceAction::Rotate));
        assert!(piece.try_drop(&field));
        assert_eq!(piece.last_action(), Some(PieceAction::Drop));
        piece.drop_to_floor(&field);
        assert_eq!(piece.last_action(), Some(PieceAction::Drop));
    }
}
