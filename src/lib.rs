//! Live plotting of per-epoch training metrics.
//!
//! A [`MetricSink`] lives in the training thread and forwards every epoch's
//! metrics through a bounded channel to a [`DisplayWorker`] running on its own
//! thread, which keeps one line series per metric and redraws a
//! [`RenderSurface`] as frames arrive.

pub mod chart;
pub mod config;
pub mod error;
pub mod frame;
pub mod sink;
pub mod state;
pub mod style;
pub mod surface;
pub mod worker;

pub use chart::{ChartLayout, ChartState, Panel, Series};
pub use config::{MetricGroup, PlotConfig};
pub use error::{PlotError, Result};
pub use frame::{Metrics, MetricsFrame};
pub use sink::{MetricSink, TrainingCallback};
pub use state::{ExitReason, WorkerState, WorkerStatus};
pub use style::{LineColor, LinePattern, LineStyle, StyleMap};
pub use surface::{HeadlessHandle, HeadlessSurface, RenderSurface, SurfaceEvent};
pub use worker::DisplayWorker;
