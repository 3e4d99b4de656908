use arrayvec::ArrayVec;

use crate::core::piece::PieceKind;

/// Number of columns.
pub const WIDTH: usize = 10;
/// Number of rows, including the hidden buffer above the visible area.
pub const HEIGHT: usize = 22;
/// Number of rows shown to the player. Rows at or above this index are
/// the spawn buffer.
pub const VISIBLE_HEIGHT: usize = 20;

/// The grid pieces land on.
///
/// Coordinates are `(x, y)` with `x` growing rightward and `y` growing
/// upward, so row `0` is the floor. Each settled cell remembers the
/// kind of the piece that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playfield {
    grid: [[Option<PieceKind>; WIDTH]; HEIGHT],
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new()
    }
}

impl Playfield {
    #[must_use]
    pub fn new() -> Self {
        Self {
            grid: [[None; WIDTH]; HEIGHT],
        }
    }

    /// Builds a field from rows of `'#'` (settled) and `'.'` (empty),
    /// listed top to bottom. Rows above the drawing stay empty.
    ///
    /// # Panics
    ///
    /// Panics if the drawing is taller than the board, a row is not
    /// exactly [`WIDTH`] characters, or a character is neither `'#'`
    /// nor `'.'`.
    #[must_use]
    pub fn from_ascii(s: &str) -> Self {
        let lines = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>();
        assert!(lines.len() <= HEIGHT, "too many rows: {}", lines.len());
        let mut field = Self::new();
        for (i, line) in lines.iter().enumerate() {
            let y = lines.len() - 1 - i;
            assert_eq!(line.chars().count(), WIDTH, "bad row width: {line:?}");
            for (x, ch) in line.chars().enumerate() {
                field.grid[y][x] = match ch {
                    '#' => Some(PieceKind::I),
                    '.' => None,
                    _ => panic!("unexpected char: {ch:?}"),
                };
            }
        }
        field
    }

    /// Whether `(x, y)` is inside the board and unoccupied.
    ///
    /// Everything outside the board counts as blocked, which makes the
    /// walls and the floor fall out of the same check.
    #[must_use]
    pub fn is_clear(&self, x: i16, y: i16) -> bool {
        let Ok(x) = usize::try_from(x) else {
            return false;
        };
        let Ok(y) = usize::try_from(y) else {
            return false;
        };
        x < WIDTH && y < HEIGHT && self.grid[y][x].is_none()
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<PieceKind> {
        self.grid[y][x]
    }

    /// Settles a piece's cells onto the grid, then removes every full
    /// row among the touched ones. Returns the number of rows removed.
    ///
    /// Cells outside the board are ignored rather than rejected, so a
    /// piece locking partly above the buffer simply loses those cells.
    pub fn commit(&mut self, cells: [(i16, i16); 4], kind: PieceKind) -> usize {
        let mut touched = ArrayVec::<usize, 4>::new();
        for (x, y) in cells {
            let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
                continue;
            };
            if x >= WIDTH || y >= HEIGHT {
                continue;
            }
            self.grid[y][x] = Some(kind);
            if !touched.contains(&y) {
                touched.push(y);
            }
        }
        touched.sort_unstable();
        let mut cleared = 0;
        // Highest row first, so removals never shift a row that is
        // still waiting to be checked.
        for &y in touched.iter().rev() {
            if self.grid[y].iter().all(Option::is_some) {
                self.remove_row(y);
                cleared += 1;
            }
        }
        cleared
    }

    fn remove_row(&mut self, y: usize) {
        for row in y..HEIGHT - 1 {
            self.grid[row] = self.grid[row + 1];
        }
        self.grid[HEIGHT - 1] = [None; WIDTH];
    }

    /// Whether any settled cell sits in the hidden buffer. The session
    /// ends when this becomes true after a lock.
    #[must_use]
    pub fn is_topped_out(&self) -> bool {
        self.grid[VISIBLE_HEIGHT..]
            .iter()
            .any(|row| row.iter().any(Option::is_some))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occupied_cells(field: &Playfield) -> Vec<(usize, usize)> {
        let mut cells = Vec::new();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                if field.cell(x, y).is_some() {
                    cells.push((x, y));
                }
            }
        }
        cells
    }

    #[test]
    fn new_field_is_empty() {
        let field = Playfield::new();
        assert!(occupied_cells(&field).is_empty());
        assert!(!field.is_topped_out());
    }

    #[test]
    fn bounds_count_as_blocked() {
        let field = Playfield::new();
        assert!(field.is_clear(0, 0));
        assert!(field.is_clear(9, 21));
        assert!(!field.is_clear(-1, 0));
        assert!(!field.is_clear(10, 0));
        assert!(!field.is_clear(0, -1));
        assert!(!field.is_clear(0, 22));
    }

    #[test]
    fn from_ascii_maps_bottom_up() {
        let field = Playfield::from_ascii(
            "\
            #.........\n\
            .........#\n\
            ",
        );
        assert_eq!(occupied_cells(&field), vec![(9, 0), (0, 1)]);
    }

    #[test]
    fn commit_settles_cells() {
        let mut field = Playfield::new();
        let cleared = field.commit([(0, 0), (1, 0), (0, 1), (1, 1)], PieceKind::O);
        assert_eq!(cleared, 0);
        assert_eq!(field.cell(0, 0), Some(PieceKind::O));
        assert_eq!(field.cell(1, 1), Some(PieceKind::O));
        assert_eq!(field.cell(2, 0), None);
    }

    #[test]
    fn commit_ignores_out_of_range_cells() {
        let mut field = Playfield::new();
        let cleared = field.commit([(-1, 0), (0, 22), (10, 5), (4, 3)], PieceKind::L);
        assert_eq!(cleared, 0);
        assert_eq!(occupied_cells(&field), vec![(4, 3)]);
    }

    #[test]
    fn full_row_clears_and_stack_falls() {
        let mut field = Playfield::from_ascii(
            "\
            #.........\n\
            ########..\n\
            ",
        );
        let cleared = field.commit([(8, 0), (9, 0), (9, 1), (9, 2)], PieceKind::J);
        assert_eq!(cleared, 1);
        // The row above the cleared one drops onto the floor.
        assert_eq!(occupied_cells(&field), vec![(0, 0), (9, 0), (9, 1)]);
    }

    #[test]
    fn non_adjacent_rows_clear_together() {
        let mut field = Playfield::from_ascii(
            "\
            #########.\n\
            #.........\n\
            #########.\n\
            ",
        );
        // Vertical I in the last column fills rows 0 and 2.
        let cleared = field.commit([(9, 0), (9, 1), (9, 2), (9, 3)], PieceKind::I);
        assert_eq!(cleared, 2);
        assert_eq!(occupied_cells(&field), vec![(0, 0), (9, 0), (9, 1)]);
    }

    #[test]
    fn four_rows_clear_at_once() {
        let mut field = Playfield::from_ascii(
            "\
            #########.\n\
            #########.\n\
            #########.\n\
            #########.\n\
            ",
        );
        let cleared = field.commit([(9, 0), (9, 1), (9, 2), (9, 3)], PieceKind::I);
        assert_eq!(cleared, 4);
        assert!(occupied_cells(&field).is_empty());
    }

    #[test]
    fn buffer_row_triggers_topout() {
        let mut field = Playfield::new();
        assert!(!field.is_topped_out());
        field.commit([(4, 19), (5, 19), (4, 20), (5, 20)], PieceKind::O);
        assert!(field.is_topped_out());
    }
}
