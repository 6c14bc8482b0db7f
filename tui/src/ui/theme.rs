use ratatui::{
    style::{Color, Modifier, Style},
    symbols::Marker,
    widgets::GraphType,
};
use realtime_plotting::{LineColor, LinePattern, LineStyle};

/// Neon-green cyber theme.
///
/// Base aesthetic:
/// - neon green foreground
/// - near-black background
/// - series keep the colour of their style token
pub struct Theme;

impl Theme {
    // Core palette
    pub const BG: Color = Color::Rgb(0, 0, 0);
    pub const FG_NEON: Color = Color::Rgb(57, 255, 20);
    pub const FG_DIM: Color = Color::Rgb(0, 190, 0);
    pub const FG_MUTED: Color = Color::Rgb(80, 90, 80);

    // Series colours, softened to read well on the black background
    pub const LINE_RED: Color = Color::Rgb(255, 70, 70);
    pub const LINE_GREEN: Color = Color::Rgb(57, 255, 20);
    pub const LINE_BLUE: Color = Color::Rgb(80, 140, 255);
    pub const LINE_CYAN: Color = Color::Rgb(0, 255, 255);
    pub const LINE_MAGENTA: Color = Color::Rgb(255, 0, 255);
    pub const LINE_YELLOW: Color = Color::Rgb(255, 255, 0);
    pub const LINE_WHITE: Color = Color::Rgb(230, 230, 230);

    /// Default full-screen style.
    pub fn base() -> Style {
        Style::default().fg(Self::FG_NEON).bg(Self::BG)
    }

    /// Panel borders.
    pub fn border() -> Style {
        Style::default().fg(Self::FG_NEON).bg(Self::BG)
    }

    /// Titles (bold neon).
    pub fn title() -> Style {
        Style::default()
            .fg(Self::FG_NEON)
            .add_modifier(Modifier::BOLD)
    }

    /// Axis labels.
    pub fn dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    /// Key hints.
    pub fn muted() -> Style {
        Style::default().fg(Self::FG_MUTED)
    }

    /// Style of a series line.
    pub fn line(style: LineStyle) -> Style {
        let fg = match style.color {
            LineColor::Red => Self::LINE_RED,
            LineColor::Green => Self::LINE_GREEN,
            LineColor::Blue => Self::LINE_BLUE,
            LineColor::Cyan => Self::LINE_CYAN,
            LineColor::Magenta => Self::LINE_MAGENTA,
            LineColor::Yellow => Self::LINE_YELLOW,
            // Black would vanish on the background.
            LineColor::Black => Self::FG_MUTED,
            LineColor::White => Self::LINE_WHITE,
        };
        Style::default().fg(fg)
    }

    /// Terminal approximation of a line pattern.
    pub fn marker(pattern: LinePattern) -> (Marker, GraphType) {
        match pattern {
            LinePattern::Solid | LinePattern::DashDot => (Marker::Braille, GraphType::Line),
            LinePattern::Dashed => (Marker::Dot, GraphType::Line),
            LinePattern::Dotted => (Marker::Dot, GraphType::Scatter),
            LinePattern::Points => (Marker::Block, GraphType::Scatter),
        }
    }
}
