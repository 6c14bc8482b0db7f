use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, LegendPosition, Paragraph, Wrap},
};
use realtime_plotting::{ChartState, Panel};

use super::theme::Theme;

pub fn header(chart: Option<&ChartState>) -> Paragraph<'static> {
    let epoch = match chart.and_then(ChartState::last_epoch) {
        Some(epoch) => format!("Epoch: {epoch}"),
        None => "Waiting for the first epoch...".to_string(),
    };

    let line1 = Line::from(vec![
        Span::styled(
            "Realtime Metrics",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(epoch),
    ]);

    let latest = chart
        .map(|c| {
            c.panels()
                .iter()
                .flat_map(Panel::series)
                .filter_map(|s| s.last().map(|v| format!("{}={v:.4}", s.name())))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .unwrap_or_default();
    let line2 = Line::from(Span::raw(latest));

    Paragraph::new(vec![line1, line2])
        .style(Theme::base())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled("Overview", Theme::title())),
        )
        .wrap(Wrap { trim: true })
}

pub fn panel_chart(panel: &Panel) -> Chart<'_> {
    let datasets = panel
        .series()
        .iter()
        .map(|s| {
            let (marker, graph_type) = Theme::marker(s.style().pattern);
            Dataset::default()
                .name(s.name().to_string())
                .marker(marker)
                .graph_type(graph_type)
                .style(Theme::line(s.style()))
                .data(s.points())
        })
        .collect::<Vec<_>>();

    let x = panel.x_bounds();
    let y = panel.y_bounds();

    Chart::new(datasets)
        .style(Theme::base())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(panel.title(), Theme::title())),
        )
        .x_axis(
            Axis::default()
                .title("epoch")
                .style(Theme::dim())
                .bounds(x)
                .labels(axis_labels(x, 0)),
        )
        .y_axis(
            Axis::default()
                .style(Theme::dim())
                .bounds(y)
                .labels(axis_labels(y, 3)),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)))
}

pub fn hint() -> Paragraph<'static> {
    Paragraph::new(Span::styled("q / esc: close display", Theme::muted()))
}

/// Low, middle and high tick labels.
fn axis_labels(bounds: [f64; 2], precision: usize) -> Vec<Span<'static>> {
    let [lo, hi] = bounds;
    [lo, (lo + hi) / 2.0, hi]
        .into_iter()
        .map(|v| Span::raw(format!("{v:.precision$}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_span_the_bounds() {
        let labels = axis_labels([0.0, 10.0], 0);
        let text = labels.iter().map(|s| s.content.to_string()).collect::<Vec<_>>();
        assert_eq!(text, ["0", "5", "10"]);
    }

    #[test]
    fn labels_keep_precision() {
        let labels = axis_labels([0.25, 0.75], 3);
        assert_eq!(labels[1].content, "0.500");
    }
}
