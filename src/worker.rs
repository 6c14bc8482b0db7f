use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, error, info};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    chart::{ChartLayout, ChartState},
    config::MetricGroup,
    error::Result,
    frame::MetricsFrame,
    state::{ExitReason, WorkerState, WorkerStatus},
    style::StyleMap,
    surface::{RenderSurface, SurfaceEvent},
};

/// Longest single wait on the surface while idle; bounds how late a cancellation
/// is noticed.
const CANCEL_CHECK: Duration = Duration::from_millis(50);

/// Consumer end of the metrics channel; owns the render surface and every series.
///
/// The loop never blocks on the channel: when no frame is ready it yields to the
/// surface for at most `poll_interval`, so close events are serviced while
/// training is between epochs.
pub struct DisplayWorker<S> {
    frames: mpsc::Receiver<MetricsFrame>,
    surface: S,
    groups: Option<Vec<MetricGroup>>,
    styles: StyleMap,
    chart: Option<ChartState>,
    status: Arc<WorkerStatus>,
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl<S: RenderSurface> DisplayWorker<S> {
    pub fn new(
        frames: mpsc::Receiver<MetricsFrame>,
        surface: S,
        groups: Option<Vec<MetricGroup>>,
        styles: StyleMap,
        status: Arc<WorkerStatus>,
        cancel: CancellationToken,
        poll_interval: Duration,
    ) -> Self {
        Self {
            frames,
            surface,
            groups,
            styles,
            chart: None,
            status,
            cancel,
            poll_interval,
        }
    }

    /// Runs the poll loop until the surface is closed, the worker is cancelled or
    /// the surface fails.
    ///
    /// # Errors
    /// Returns the surface error that stopped the loop, after moving the status to
    /// [`WorkerState::Closed`].
    pub fn run(mut self) -> Result<()> {
        info!("display worker started");

        let result = self.poll_loop();
        match &result {
            Ok(reason) => {
                info!("display worker stopped: {reason:?}");
                self.status.close(*reason);
            }
            Err(e) => {
                error!("display worker failed: {e}");
                self.status.close(ExitReason::Failed);
            }
        }
        // The exit reason is published first: a producer whose send fails reads it
        // to tell a user close from a crash.
        self.frames.close();

        result.map(|_| ())
    }

    fn poll_loop(&mut self) -> Result<ExitReason> {
        let mut drained = false;

        loop {
            if self.cancel.is_cancelled() {
                // Frames still queued are dropped with the receiver.
                return Ok(ExitReason::Cancelled);
            }

            let event = match self.frames.try_recv() {
                Ok(frame) => {
                    self.process_frame(frame)?;
                    self.surface.pump(Duration::ZERO)?
                }
                Err(TryRecvError::Empty) => self.idle_pump()?,
                Err(TryRecvError::Disconnected) => {
                    if !drained {
                        debug!("training finished, every frame drawn");
                        drained = true;
                    }
                    self.idle_pump()?
                }
            };

            match event {
                SurfaceEvent::Idle => {}
                SurfaceEvent::RedrawRequested => {
                    if let Some(chart) = &self.chart {
                        self.surface.render(chart)?;
                    }
                }
                SurfaceEvent::Closed => return Ok(ExitReason::WindowClosed),
            }
        }
    }

    /// Yields to the surface for up to `poll_interval`, in slices of at most
    /// [`CANCEL_CHECK`] so a cancellation is never left waiting on a long interval.
    fn idle_pump(&mut self) -> Result<SurfaceEvent> {
        let started = Instant::now();
        loop {
            let remaining = self.poll_interval.saturating_sub(started.elapsed());
            let event = self.surface.pump(remaining.min(CANCEL_CHECK))?;
            if event != SurfaceEvent::Idle
                || remaining <= CANCEL_CHECK
                || self.cancel.is_cancelled()
            {
                return Ok(event);
            }
        }
    }

    /// Applies one frame and redraws.
    ///
    /// Frames violating the layout contract are logged and skipped; only surface
    /// failures are returned.
    fn process_frame(&mut self, frame: MetricsFrame) -> Result<()> {
        let chart = match self.chart.take() {
            Some(chart) => chart,
            None => match ChartLayout::resolve(self.groups.as_deref(), &frame) {
                Ok(layout) => {
                    let chart = ChartState::new(layout, &self.styles);
                    self.surface.init(&chart)?;
                    self.status.set_running();
                    info!(
                        "chart laid out with {} panel(s) at epoch {}",
                        chart.layout().num_panels(),
                        frame.epoch
                    );
                    chart
                }
                Err(e) => {
                    error!("frame rejected: {e}");
                    self.status.frame_rejected();
                    return Ok(());
                }
            },
        };
        let chart = self.chart.insert(chart);

        match chart.apply(&frame) {
            Ok(()) => {
                self.status.frame_processed();
                self.surface.render(chart)
            }
            Err(e) if e.is_contract_violation() => {
                error!("frame rejected: {e}");
                self.status.frame_rejected();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.status.state()
    }
}
