use ratatui::{widgets::Block, Frame};
use realtime_plotting::ChartState;

use super::{layout, theme::Theme, widgets};

/// Draws the entire UI; `chart` is `None` until the first epoch is laid out.
pub fn draw(f: &mut Frame, chart: Option<&ChartState>) {
    let area = f.size();
    f.render_widget(Block::default().style(Theme::base()), area);

    let panels = chart.map_or(&[][..], ChartState::panels);
    let (header_area, panel_areas, footer_area) = layout::vertical(area, panels.len());

    f.render_widget(widgets::header(chart), header_area);

    for (panel, panel_area) in panels.iter().zip(panel_areas) {
        f.render_widget(widgets::panel_chart(panel), panel_area);
    }

    f.render_widget(widgets::hint(), footer_area);
}
