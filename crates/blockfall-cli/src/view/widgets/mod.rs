use ratatui::{layout::Rect, widgets::Block as BlockWidget};

pub use self::{
    block_display::*, board_display::*, piece_display::*, piece_stack_display::*,
    session_display::*, session_stats_display::*,
};

mod block_display;
mod board_display;
mod piece_display;
mod piece_stack_display;
mod session_display;
mod session_stats_display;

mod color {
    use ratatui::style::Color;

    pub const CYAN: Color = Color::Rgb(1, 237, 250);
    pub const YELLOW: Color = Color::Rgb(254, 251, 52);
    pub const GREEN: Color = Color::Rgb(83, 218, 63);
    pub const SALMON: Color = Color::Rgb(253, 63, 89);
    pub const BLUE: Color = Color::Rgb(0, 119, 211);
    pub const ORANGE: Color = Color::Rgb(255, 200, 46);
    pub const PURPLE: Color = Color::Rgb(221, 10, 178);
    pub const RED: Color = Color::Rgb(255, 0, 0);
    pub const GRAY: Color = Color::Rgb(127, 127, 127);
    pub const BLACK: Color = Color::Rgb(0, 0, 0);
    pub const WHITE: Color = Color::Rgb(255, 255, 255);
}

pub mod style {
    use blockfall_engine::PieceKind;
    use ratatui::style::{Color, Style};

    use crate::view::widgets::color;

    const fn fg_bg(fg: Color, bg: Color) -> Style {
        Style::new().fg(fg).bg(bg)
    }

    const fn bg_only(color: Color) -> Style {
        Style::new().fg(color).bg(color)
    }

    pub const DEFAULT: Style = fg_bg(color::WHITE, color::BLACK);
    pub const EMPTY: Style = bg_only(color::BLACK);
    pub const EMPTY_DOT: Style = fg_bg(color::GRAY, color::BLACK);
    pub const GHOST: Style = fg_bg(color::WHITE, color::BLACK);

    #[must_use]
    pub const fn piece(kind: PieceKind) -> Style {
        let color = match kind {
            PieceKind::I => color::CYAN,
            PieceKind::O => color::YELLOW,
            PieceKind::S => color::GREEN,
            PieceKind::Z => color::SALMON,
            PieceKind::J => color::BLUE,
            PieceKind::L => color::ORANGE,
            PieceKind::T => color::PURPLE,
        };
        bg_only(color)
    }
}

fn block_vertical_margin(block: Option<&BlockWidget>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.height - inner_rect.height
}

fn block_horizontal_margin(block: Option<&BlockWidget>) -> u16 {
    let dummy_rect = Rect::new(0, 0, 100, 100);
    let inner_rect = block.map_or(dummy_rect, |block| block.inner(dummy_rect));
    dummy_rect.width - inner_rect.width
}
