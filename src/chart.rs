use std::collections::HashSet;

use log::debug;

use crate::{
    config::MetricGroup,
    error::{PlotError, Result},
    frame::MetricsFrame,
    style::{LineStyle, StyleMap},
};

/// Fraction of the observed y-span added above and below a panel's series.
const Y_PAD_FRACTION: f64 = 0.05;
/// Smallest padding used when every observed value of a panel is the same.
const MIN_Y_PAD: f64 = 1e-3;

/// Metric names per panel, fixed once the first frame has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLayout {
    groups: Vec<Vec<String>>,
}

impl ChartLayout {
    /// Resolves the layout from the configured groups, or infers one panel per
    /// metric of `first` in the order its keys were observed.
    ///
    /// # Errors
    /// Returns [`PlotError::EmptyFrame`] when nothing can be laid out.
    pub fn resolve(groups: Option<&[MetricGroup]>, first: &MetricsFrame) -> Result<Self> {
        let groups: Vec<Vec<String>> = match groups {
            Some(groups) => groups.iter().map(|g| g.metrics().to_vec()).collect(),
            None => first.values.keys().map(|k| vec![k.to_string()]).collect(),
        };

        if groups.is_empty() {
            return Err(PlotError::EmptyFrame { epoch: first.epoch });
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn num_panels(&self) -> usize {
        self.groups.len()
    }

    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().flatten().map(String::as_str)
    }
}

/// Accumulated points of one metric.
#[derive(Debug, Clone)]
pub struct Series {
    name: String,
    style: LineStyle,
    points: Vec<(f64, f64)>,
}

impl Series {
    fn new(name: String, style: LineStyle) -> Self {
        Self {
            name,
            style,
            points: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> LineStyle {
        self.style
    }

    /// `(epoch, value)` pairs in arrival order.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(x, _)| *x)
    }

    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, y)| *y)
    }

    pub fn last(&self) -> Option<f64> {
        self.points.last().map(|(_, y)| *y)
    }
}

/// One chart panel: the series of a group and the axis limits they share.
#[derive(Debug, Clone)]
pub struct Panel {
    series: Vec<Series>,
    y_min: f64,
    y_max: f64,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl Panel {
    fn new(series: Vec<Series>) -> Self {
        Self {
            series,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
            x_bounds: [0.0, 1.0],
            y_bounds: [0.0, 1.0],
        }
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Metric names shown in the panel legend.
    pub fn legend(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(Series::name)
    }

    pub fn title(&self) -> String {
        self.legend().collect::<Vec<_>>().join(" / ")
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        self.x_bounds
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        self.y_bounds
    }

    fn observe(&mut self, value: f64) {
        if value.is_finite() {
            self.y_min = self.y_min.min(value);
            self.y_max = self.y_max.max(value);
        }
    }

    fn rescale(&mut self, epoch: usize) {
        self.x_bounds = [0.0, (epoch as f64).max(1.0)];

        if self.y_min > self.y_max {
            // Nothing finite observed yet.
            return;
        }

        let span = self.y_max - self.y_min;
        let pad = if span > 0.0 {
            span * Y_PAD_FRACTION
        } else {
            (self.y_min.abs() * Y_PAD_FRACTION).max(MIN_Y_PAD)
        };
        self.y_bounds = [self.y_min - pad, self.y_max + pad];
    }
}

/// Worker-owned chart model: one [`Panel`] per group, one [`Series`] per metric.
#[derive(Debug, Clone)]
pub struct ChartState {
    layout: ChartLayout,
    panels: Vec<Panel>,
    last_epoch: Option<usize>,
    ignored: HashSet<String>,
}

impl ChartState {
    pub fn new(layout: ChartLayout, styles: &StyleMap) -> Self {
        let panels = layout
            .groups()
            .iter()
            .map(|group| {
                let series = group
                    .iter()
                    .map(|metric| Series::new(metric.clone(), styles.resolve(metric)))
                    .collect();
                Panel::new(series)
            })
            .collect();

        Self {
            layout,
            panels,
            last_epoch: None,
            ignored: HashSet::new(),
        }
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn last_epoch(&self) -> Option<usize> {
        self.last_epoch
    }

    pub fn series(&self, metric: &str) -> Option<&Series> {
        self.panels
            .iter()
            .flat_map(|p| p.series.iter())
            .find(|s| s.name == metric)
    }

    /// Latest value plotted for `metric`.
    pub fn latest(&self, metric: &str) -> Option<f64> {
        self.series(metric).and_then(Series::last)
    }

    /// Appends one frame to every series and rescales the panels.
    ///
    /// Metrics of the frame that are not part of the layout are ignored.
    ///
    /// # Errors
    /// Returns [`PlotError::MissingMetric`] if a laid-out metric is absent from the
    /// frame; in that case no series is modified.
    pub fn apply(&mut self, frame: &MetricsFrame) -> Result<()> {
        if let Some(metric) = self.layout.metrics().find(|m| !frame.values.contains(m)) {
            return Err(PlotError::MissingMetric {
                epoch: frame.epoch,
                metric: metric.to_string(),
            });
        }

        for name in frame.values.keys() {
            if self.series(name).is_none() && self.ignored.insert(name.to_string()) {
                debug!("ignoring metric '{name}', not part of the chart layout");
            }
        }

        let x = frame.epoch as f64;
        for panel in &mut self.panels {
            for i in 0..panel.series.len() {
                let Some(y) = frame.values.get(&panel.series[i].name) else {
                    continue;
                };
                panel.series[i].points.push((x, y));
                panel.observe(y);
            }
            panel.rescale(frame.epoch);
        }

        self.last_epoch = Some(frame.epoch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Metrics;

    fn frame(epoch: usize, values: &[(&str, f64)]) -> MetricsFrame {
        MetricsFrame::new(epoch, values.iter().map(|(k, v)| (*k, *v)).collect::<Metrics>())
    }

    fn chart(groups: Option<&[MetricGroup]>, first: &MetricsFrame) -> ChartState {
        let layout = ChartLayout::resolve(groups, first).unwrap();
        ChartState::new(layout, &StyleMap::default())
    }

    #[test]
    fn infers_one_panel_per_key_in_observed_order() {
        let first = frame(0, &[("loss", 0.5), ("acc", 0.9)]);
        let chart = chart(None, &first);

        assert_eq!(chart.panels().len(), 2);
        assert_eq!(chart.panels()[0].legend().collect::<Vec<_>>(), ["loss"]);
        assert_eq!(chart.panels()[1].legend().collect::<Vec<_>>(), ["acc"]);
    }

    #[test]
    fn explicit_groups_share_panels() {
        let groups = [
            MetricGroup::from(vec!["loss", "val_loss"]),
            MetricGroup::from("acc"),
        ];
        let first = frame(0, &[("acc", 0.1), ("loss", 1.0), ("val_loss", 1.2)]);
        let chart = chart(Some(&groups), &first);

        assert_eq!(chart.panels().len(), 2);
        assert_eq!(
            chart.panels()[0].legend().collect::<Vec<_>>(),
            ["loss", "val_loss"]
        );
        assert_eq!(chart.panels()[1].legend().collect::<Vec<_>>(), ["acc"]);
        assert_eq!(chart.panels()[0].title(), "loss / val_loss");
    }

    #[test]
    fn empty_first_frame_cannot_be_laid_out() {
        let err = ChartLayout::resolve(None, &frame(0, &[])).unwrap_err();
        assert!(matches!(err, PlotError::EmptyFrame { epoch: 0 }));
    }

    #[test]
    fn accumulates_series_in_epoch_order() {
        let values = [0.9, 0.7, 0.4, 0.35];
        let first = frame(0, &[("loss", values[0])]);
        let mut chart = chart(None, &first);

        for (epoch, v) in values.iter().enumerate() {
            chart.apply(&frame(epoch, &[("loss", *v)])).unwrap();
        }

        let loss = chart.series("loss").unwrap();
        assert_eq!(loss.xs().collect::<Vec<_>>(), [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(loss.ys().collect::<Vec<_>>(), values);
        assert_eq!(chart.last_epoch(), Some(3));
        assert_eq!(chart.latest("loss"), Some(0.35));
    }

    #[test]
    fn axes_autoscale_to_observed_range() {
        let groups = [MetricGroup::from(vec!["loss", "val_loss"])];
        let first = frame(0, &[("loss", 1.0), ("val_loss", 3.0)]);
        let mut chart = chart(Some(&groups), &first);

        chart.apply(&first).unwrap();
        chart.apply(&frame(1, &[("loss", 0.0), ("val_loss", 2.0)])).unwrap();

        let panel = &chart.panels()[0];
        assert_eq!(panel.x_bounds(), [0.0, 1.0]);
        let [lo, hi] = panel.y_bounds();
        assert!((lo - (-0.15)).abs() < 1e-12);
        assert!((hi - 3.15).abs() < 1e-12);
    }

    #[test]
    fn flat_series_gets_non_degenerate_range() {
        let first = frame(0, &[("acc", 0.0)]);
        let mut chart = chart(None, &first);
        chart.apply(&first).unwrap();

        let [lo, hi] = chart.panels()[0].y_bounds();
        assert!(lo < 0.0 && hi > 0.0);
        assert_eq!(chart.panels()[0].x_bounds(), [0.0, 1.0]);
    }

    #[test]
    fn non_finite_values_are_plotted_but_do_not_scale() {
        let first = frame(0, &[("loss", 1.0)]);
        let mut chart = chart(None, &first);
        chart.apply(&first).unwrap();
        chart.apply(&frame(1, &[("loss", f64::NAN)])).unwrap();

        assert_eq!(chart.series("loss").unwrap().points().len(), 2);
        let [lo, hi] = chart.panels()[0].y_bounds();
        assert!(lo.is_finite() && hi.is_finite());
    }

    #[test]
    fn missing_metric_rejects_the_whole_frame() {
        let first = frame(0, &[("loss", 1.0), ("acc", 0.5)]);
        let mut chart = chart(None, &first);
        chart.apply(&first).unwrap();

        let err = chart.apply(&frame(1, &[("loss", 0.8)])).unwrap_err();
        assert!(matches!(
            err,
            PlotError::MissingMetric { epoch: 1, ref metric } if metric == "acc"
        ));
        assert_eq!(chart.series("loss").unwrap().points().len(), 1);
        assert_eq!(chart.last_epoch(), Some(0));
    }

    #[test]
    fn extra_metrics_are_ignored() {
        let first = frame(0, &[("loss", 1.0)]);
        let mut chart = chart(None, &first);
        chart.apply(&first).unwrap();
        chart.apply(&frame(1, &[("loss", 0.5), ("lr", 0.01)])).unwrap();

        assert!(chart.series("lr").is_none());
        assert_eq!(chart.panels().len(), 1);
        assert_eq!(chart.series("loss").unwrap().points().len(), 2);
    }
}
