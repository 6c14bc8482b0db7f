use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Computes the main layout regions.
///
/// # Returns
/// (header, one area per panel, footer)
pub fn vertical(area: Rect, panels: usize) -> (Rect, Vec<Rect>, Rect) {
    let body = panels.max(1) as u32;

    let constraints = std::iter::once(Constraint::Length(4))
        .chain((0..body).map(|_| Constraint::Ratio(1, body)))
        .chain(std::iter::once(Constraint::Length(1)))
        .collect::<Vec<_>>();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let header = chunks[0];
    let footer = chunks[chunks.len() - 1];
    let panels = chunks[1..chunks.len() - 1].iter().take(panels).copied().collect();

    (header, panels, footer)
}
