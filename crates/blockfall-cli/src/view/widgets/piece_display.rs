use blockfall_engine::PieceKind;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::view::widgets::{BlockDisplay, Tile};

/// Number of columns in a preview box.
const BOX_WIDTH: usize = 4;
/// Number of rows in a preview box.
const BOX_HEIGHT: usize = 2;

/// A single piece in its spawn orientation, for the hold and next
/// panels. Without a piece the box renders empty.
#[derive(Debug)]
pub struct PieceDisplay<'a> {
    piece: Option<PieceKind>,
    block: Option<BlockWidget<'a>>,
}

impl<'a> PieceDisplay<'a> {
    pub fn new() -> Self {
        Self {
            piece: None,
            block: None,
        }
    }

    pub fn piece(self, piece: PieceKind) -> Self {
        Self {
            piece: Some(piece),
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
        u16::try_from(BOX_WIDTH).unwrap() * BlockDisplay::width()
            + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        u16::try_from(BOX_HEIGHT).unwrap() * BlockDisplay::height()
            + super::block_vertical_margin(self.block.as_ref())
    }
}

impl Default for PieceDisplay<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &PieceDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let col_constraints = (0..BOX_WIDTH).map(|_| Constraint::Length(BlockDisplay::width()));
        let row_constraints = (0..BOX_HEIGHT).map(|_| Constraint::Length(BlockDisplay::height()));
        let horizontal = Layout::horizontal(col_constraints).flex(Flex::Center);
        let vertical = Layout::vertical(row_constraints);
        let grid_rows = area
            .layout::<{ BOX_HEIGHT }>(&vertical)
            .into_iter()
            .map(|row| row.layout::<{ BOX_WIDTH }>(&horizontal));

        let cells = self.piece.map(PieceKind::preview_cells);
        for (y, grid_row) in grid_rows.enumerate() {
            for (x, grid_cell) in grid_row.into_iter().enumerate() {
                let occupied = cells.is_some_and(|cells| cells.contains(&(x, y)));
                let tile = match (occupied, self.piece) {
                    (true, Some(kind)) => Tile::Piece(kind),
                    _ => Tile::Empty,
                };
                BlockDisplay::from_tile(tile, false).render(grid_cell, buf);
            }
        }
    }
}
