use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    time::Duration,
};

use log::{debug, info};

use crate::{chart::ChartState, error::Result};

/// What happened on the surface while the worker yielded to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Idle,
    /// The surface lost its contents (e.g. a resize) and wants the chart again.
    RedrawRequested,
    /// The user closed the surface.
    Closed,
}

/// The charting toolkit seen from the display worker.
///
/// A surface is created, used and dropped on the worker's thread only, so
/// implementations need not be `Send`.
pub trait RenderSurface {
    /// Allocates one panel per group of `chart`, stacked and sharing the x-axis.
    fn init(&mut self, chart: &ChartState) -> Result<()>;

    /// Pushes the current series data and axis limits, then redraws.
    fn render(&mut self, chart: &ChartState) -> Result<()>;

    /// Lets the surface process its own events for at most `timeout`.
    fn pump(&mut self, timeout: Duration) -> Result<SurfaceEvent>;
}

#[derive(Debug, Default)]
struct Recorded {
    closed: bool,
    panels: Option<Vec<Vec<String>>>,
    epochs: Vec<usize>,
    latest: Option<ChartState>,
}

#[derive(Debug, Default)]
struct Shared {
    recorded: Mutex<Recorded>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Recorded> {
        // A poisoned lock only means a test thread panicked mid-read.
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A display-less surface that logs every redraw.
///
/// Useful on machines without a terminal and as the observable end of the
/// worker in tests: the paired [`HeadlessHandle`] exposes what was rendered and
/// can fire the close event.
#[derive(Debug)]
pub struct HeadlessSurface {
    shared: Arc<Shared>,
}

/// Observer side of a [`HeadlessSurface`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct HeadlessHandle {
    shared: Arc<Shared>,
}

impl HeadlessSurface {
    pub fn pair() -> (Self, HeadlessHandle) {
        let shared = Arc::new(Shared::default());
        (
            Self {
                shared: Arc::clone(&shared),
            },
            HeadlessHandle { shared },
        )
    }
}

impl RenderSurface for HeadlessSurface {
    fn init(&mut self, chart: &ChartState) -> Result<()> {
        let panels = chart.layout().groups().to_vec();
        info!("headless display with {} panel(s): {panels:?}", panels.len());
        self.shared.lock().panels = Some(panels);
        Ok(())
    }

    fn render(&mut self, chart: &ChartState) -> Result<()> {
        let Some(epoch) = chart.last_epoch() else {
            return Ok(());
        };

        let summary = chart
            .panels()
            .iter()
            .flat_map(|p| p.series())
            .filter_map(|s| s.last().map(|v| format!("{}={v:.4}", s.name())))
            .collect::<Vec<_>>()
            .join(" ");
        debug!("epoch {epoch}: {summary}");

        let mut recorded = self.shared.lock();
        recorded.epochs.push(epoch);
        recorded.latest = Some(chart.clone());
        Ok(())
    }

    fn pump(&mut self, timeout: Duration) -> Result<SurfaceEvent> {
        let guard = self.shared.lock();
        let (guard, _) = self
            .shared
            .wake
            .wait_timeout_while(guard, timeout, |r| !r.closed)
            .unwrap_or_else(|e| e.into_inner());

        Ok(if guard.closed {
            SurfaceEvent::Closed
        } else {
            SurfaceEvent::Idle
        })
    }
}

impl HeadlessHandle {
    /// Fires the close event, as if the user closed the window.
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.wake.notify_all();
    }

    /// Metric names per panel, once the first frame has been laid out.
    pub fn panels(&self) -> Option<Vec<Vec<String>>> {
        self.shared.lock().panels.clone()
    }

    /// Epochs of every redraw, in the order they were rendered.
    pub fn rendered_epochs(&self) -> Vec<usize> {
        self.shared.lock().epochs.clone()
    }

    /// The chart as of the most recent redraw.
    pub fn latest(&self) -> Option<ChartState> {
        self.shared.lock().latest.clone()
    }
}
