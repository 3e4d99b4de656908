use std::iter;

use blockfall_engine::GameSession;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::{Block as BlockWidget, BlockExt as _, Widget},
};

use crate::view::widgets::style;

/// Score, level and clear counters beside the board.
pub struct SessionStatsDisplay<'a> {
    session: &'a GameSession,
    high_score: u64,
    block: Option<BlockWidget<'a>>,
}

enum Row {
    Empty,
    Full(&'static str, String),
    Split(&'static str, String),
}

impl<'a> SessionStatsDisplay<'a> {
    pub fn new(session: &'a GameSession, high_score: u64) -> Self {
        Self {
            session,
            high_score,
            block: None,
        }
    }

    pub fn block(self, block: BlockWidget<'a>) -> Self {
        Self {
            block: Some(block),
            ..self
        }
    }

    pub fn width(&self) -> u16 {
        20 + super::block_horizontal_margin(self.block.as_ref())
    }

    pub fn height(&self) -> u16 {
        u16::try_from(self.rows().len()).unwrap()
            + super::block_vertical_margin(self.block.as_ref())
    }

    fn rows(&self) -> Vec<Row> {
        let stats = self.session.stats();
        let combo = stats
            .combo()
            .filter(|&combo| combo > 0)
            .map_or_else(|| "-".to_owned(), |combo| format!("x{combo}"));
        vec![
            Row::Full("SCORE:", stats.score().to_string()),
            Row::Full("HIGH SCORE:", self.high_score.to_string()),
            Row::Empty,
            Row::Split("LEVEL:", stats.level().to_string()),
            Row::Split("LINES:", stats.total_lines().to_string()),
            Row::Split("NEXT IN:", stats.lines_to_next_level().to_string()),
            Row::Empty,
            Row::Split("PIECES:", stats.placed_pieces().to_string()),
            Row::Split("COMBO:", combo),
            Row::Split("SINGLES:", stats.clear_count(1).to_string()),
            Row::Split("DOUBLES:", stats.clear_count(2).to_string()),
            Row::Split("TRIPLES:", stats.clear_count(3).to_string()),
            Row::Split("TETRIS:", stats.clear_count(4).to_string()),
        ]
    }
}

impl Widget for SessionStatsDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.block.as_ref().render(area, buf);
        let area = self.block.inner_if_some(area);

        let style = style::DEFAULT;
        let rows = self.rows();
        let row_areas = Layout::vertical((0..rows.len()).map(|_| Constraint::Length(1))).split(area);

        for (row, area) in iter::zip(rows, row_areas.iter().copied()) {
            match row {
                Row::Empty => {}
                Row::Full(label, value) => {
                    // Label and value on the same line would overflow,
                    // so the value gets the full width.
                    Line::styled(label, style).left_aligned().render(area, buf);
                    let [_, value_area] = area.layout(&Layout::horizontal([
                        Constraint::Length(u16::try_from(label.len()).unwrap()),
                        Constraint::Fill(1),
                    ]));
                    Line::styled(value, style)
                        .right_aligned()
                        .render(value_area, buf);
                }
                Row::Split(label, value) => {
                    let [label_area, value_area] = area.layout(&Layout::horizontal([
                        Constraint::Fill(1),
                        Constraint::Fill(1),
                    ]));
                    Line::styled(label, style)
                        .left_aligned()
                        .render(label_area, buf);
                    Line::styled(value, style)
                        .right_aligned()
                        .render(value_area, buf);
                }
            }
        }
    }
}
