use blockfall_engine::{GameSession, SessionState};
use ratatui::{
    layout::{Constraint, Flex, Layout},
    prelude::{Buffer, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Widget},
};

use crate::view::widgets::{
    BoardDisplay, PieceDisplay, PieceStackDisplay, SessionStatsDisplay, color, style,
};

/// Number of upcoming pieces shown beside the board.
const NEXT_PIECES: usize = 5;

/// The whole game screen: hold and stats on the left, the board in the
/// middle, the next queue on the right.
#[derive(Debug)]
pub struct SessionDisplay<'a> {
    session: &'a GameSession,
    high_score: u64,
    announcement: Option<&'a str>,
}

impl<'a> SessionDisplay<'a> {
    pub fn new(session: &'a GameSession) -> Self {
        Self {
            session,
            high_score: 0,
            announcement: None,
        }
    }

    pub fn high_score(self, high_score: u64) -> Self {
        Self { high_score, ..self }
    }

    pub fn announcement(self, announcement: Option<&'a str>) -> Self {
        Self {
            announcement,
            ..self
        }
    }
}

impl Widget for SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        Widget::render(&self, area, buf);
    }
}

impl Widget for &SessionDisplay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer)
    where
        Self: Sized,
    {
        let style = style::DEFAULT;
        let block_padding = Padding::symmetric(1, 0);
        let border_style = match self.session.state() {
            SessionState::Playing => color::WHITE,
            SessionState::Paused => color::YELLOW,
            SessionState::GameOver => color::RED,
        };

        let game_board = {
            let widget = BoardDisplay::new(self.session.field(), self.session.current_piece())
                .block(Block::bordered().border_style(border_style).style(style));
            match self.session.ghost_cells() {
                Some(cells) => widget.ghost(cells),
                None => widget,
            }
        };
        let hold_panel = {
            let panel = PieceDisplay::new().block(
                Block::bordered()
                    .title(Line::from("HOLD").centered())
                    .padding(block_padding)
                    .border_style(border_style)
                    .style(style),
            );
            match self.session.held_piece() {
                Some(piece) => panel.piece(piece),
                None => panel,
            }
        };
        let piece_stack = PieceStackDisplay::new(self.session.next_pieces(NEXT_PIECES)).block(
            Block::bordered()
                .title(Line::from("NEXT").centered())
                .padding(block_padding)
                .border_style(border_style)
                .style(style),
        );
        let session_stats = SessionStatsDisplay::new(self.session, self.high_score).block(
            Block::bordered()
                .title(Line::from("STATS").centered())
                .padding(block_padding)
                .border_style(border_style)
                .style(style),
        );

        let [left_column, center_column, right_column] = Layout::horizontal([
            Constraint::Length(u16::max(hold_panel.width(), session_stats.width())),
            Constraint::Length(game_board.width()),
            Constraint::Length(piece_stack.width()),
        ])
        .flex(Flex::Center)
        .spacing(1)
        .areas(area);

        let [hold_area, stats_area] = Layout::vertical([
            Constraint::Length(hold_panel.height()),
            Constraint::Length(session_stats.height()),
        ])
        .spacing(1)
        .areas(left_column);
        let hold_area = hold_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(hold_panel.width())]).flex(Flex::End),
        )[0];
        let stats_area = stats_area.layout::<1>(
            &Layout::horizontal([Constraint::Length(session_stats.width())]).flex(Flex::End),
        )[0];

        let [board_area] =
            Layout::vertical([Constraint::Length(game_board.height())]).areas(center_column);
        let [piece_stack_area] =
            Layout::vertical([Constraint::Length(piece_stack.height())]).areas(right_column);

        let board_width = game_board.width();
        hold_panel.render(hold_area, buf);
        session_stats.render(stats_area, buf);
        game_board.render(board_area, buf);
        piece_stack.render(piece_stack_area, buf);

        if let Some(announcement) = self.announcement
            && self.session.state().is_playing()
        {
            let area = board_area.centered(
                Constraint::Length(board_width),
                Constraint::Length(1),
            );
            Text::styled(announcement, Style::new().fg(color::YELLOW).bg(color::BLACK))
                .centered()
                .render(area, buf);
        }

        let popup = match self.session.state() {
            SessionState::Playing => None,
            SessionState::Paused => {
                Some(("PAUSED", Style::new().fg(color::BLACK).bg(color::YELLOW)))
            }
            SessionState::GameOver => {
                Some(("GAME OVER!!", Style::new().fg(color::WHITE).bg(color::RED)))
            }
        };

        if let Some((text, style)) = popup {
            let block = Block::new().style(style);
            let text = Text::styled(text, style).centered();
            let area = board_area.centered(Constraint::Length(board_width), Constraint::Length(3));
            let inner = block.inner(area);
            Clear.render(area, buf);
            block.render(area, buf);
            text.render(inner.centered_vertically(Constraint::Length(1)), buf);
        }
    }
}
