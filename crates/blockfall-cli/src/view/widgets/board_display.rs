use blockfall_engine::{Piece, Playfield, VISIBLE_HEIGHT, WIDTH};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::view::widgets::{BlockDisplay, Tile};

/// The visible playfield with the falling piece and its ghost drawn
/// on top.
#[derive(Debug)]
pub struct BoardDisplay<'a> {
    field: &'a Playfield,
    piece: &'a Piece,
    ghost: Option<[(i16, i16); 4]>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> BoardDisplay<'a> {
    pub fn new(field: &'a Playfield, piece: &'a Piece) -> Self {
        Self {
            field,
            piece,
            ghost: None,
            block: None,
        }
    }

    pub fn ghost(self, cells: [(i16, i16); 4]) -> Self {
        Self {
            ghost: Some(cells),
            ..self
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        u16::try_from(WIDTH).unwrap() * BlockDisplay::width()
            + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        u16::try_from(VISIBLE_HEIGHT).unwrap() * BlockDisplay::height()
            + super::block_vertical_margin(self.block.as_ref())
    }

    fn tile_at(&self, x: usize, y: usize) -> Tile {
        let pos = (
            i16::try_from(x).unwrap_or(i16::MAX),
            i16::try_from(y).unwrap_or(i16::MAX),
        );
        if self.piece.cells().contains(&pos) {
            return Tile::Piece(self.piece.kind());
        }
        if let Some(ghost) = self.ghost
            && ghost.contains(&pos)
        {
            return Tile::Ghost;
        }
        match self.field.cell(x, y) {
            Some(kind) => Tile::Piece(kind),
            None => Tile::Empty,
        }
    }
}

impl Widget for BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &BoardDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints = (0..WIDTH).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints =
            (0..VISIBLE_HEIGHT).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);

        let grid_rows = area
            .layout::<{ VISIBLE_HEIGHT }>(&vertical)
            .into_iter()
            .map(|row| row.layout::<{ WIDTH }>(&horizontal));

        // The first screen row is the top of the visible area.
        for (grid_row, y) in grid_rows.zip((0..VISIBLE_HEIGHT).rev()) {
            for (grid_cell, x) in grid_row.into_iter().zip(0..WIDTH) {
                BlockDisplay::from_tile(self.tile_at(x, y), true).render(grid_cell, buf);
            }
        }
    }
}
