use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::{
    config::PlotConfig,
    error::{PlotError, Result},
    frame::{Metrics, MetricsFrame},
    state::{ExitReason, WorkerState, WorkerStatus},
    style::StyleMap,
    surface::RenderSurface,
    worker::DisplayWorker,
};

const WORKER_THREAD_NAME: &str = "display-worker";

/// Hooks a training loop calls as it progresses.
///
/// Every method has a no-op default, so implementors only override the events
/// they care about.
pub trait TrainingCallback {
    /// Called once per completed epoch, epochs counting up from 0.
    fn on_epoch_end(&mut self, _epoch: usize, _logs: &Metrics) -> Result<()> {
        Ok(())
    }

    /// Called once after the last epoch.
    fn on_train_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Producer end of the metrics channel, living in the training thread.
///
/// Owns the channel and the display worker's lifecycle. Dropping the sink runs
/// the same shutdown as [`MetricSink::shutdown`], at most once.
pub struct MetricSink {
    frames: Option<mpsc::Sender<MetricsFrame>>,
    worker: Option<JoinHandle<Result<()>>>,
    status: Arc<WorkerStatus>,
    cancel: CancellationToken,
    wait_for_worker: bool,
}

impl MetricSink {
    /// Creates the channel and starts the display worker on its own thread.
    ///
    /// `make_surface` runs on the worker thread, so render objects never cross
    /// into the training thread. This returns once the surface exists.
    ///
    /// # Errors
    /// Returns [`PlotError::InvalidConfig`] for a bad config,
    /// [`PlotError::WorkerSpawn`] if the thread cannot be started, or the error
    /// `make_surface` failed with.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous runtime.
    pub fn configure<S, F>(config: PlotConfig, make_surface: F) -> Result<Self>
    where
        S: RenderSurface,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        config.validate()?;
        let styles = StyleMap::parse(&config.styles)?;
        let poll_interval = config.poll_interval_duration();
        let groups = config.groups;

        let (tx, rx) = mpsc::channel(config.channel_capacity.get());
        let (ready_tx, ready_rx) = oneshot::channel();
        let status = Arc::new(WorkerStatus::default());
        let cancel = CancellationToken::new();

        let worker_status = Arc::clone(&status);
        let worker_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || {
                let surface = match make_surface() {
                    Ok(surface) => {
                        let _ = ready_tx.send(Ok(()));
                        surface
                    }
                    Err(e) => {
                        worker_status.close(ExitReason::Failed);
                        let _ = ready_tx.send(Err(e));
                        return Ok(());
                    }
                };

                DisplayWorker::new(
                    rx,
                    surface,
                    groups,
                    styles,
                    worker_status,
                    worker_cancel,
                    poll_interval,
                )
                .run()
            })
            .map_err(PlotError::WorkerSpawn)?;

        match ready_rx.blocking_recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                // The factory panicked before answering.
                let _ = handle.join();
                return Err(PlotError::WorkerPanicked);
            }
        }

        info!(
            "display worker started (capacity={}, wait_for_worker={})",
            config.channel_capacity, config.wait_for_worker
        );

        Ok(Self {
            frames: Some(tx),
            worker: Some(handle),
            status,
            cancel,
            wait_for_worker: config.wait_for_worker,
        })
    }

    /// Hands one epoch's metrics to the display worker.
    ///
    /// Blocks while the channel is full, so a slow display throttles training
    /// instead of losing frames. Once the user has closed the display, frames
    /// are dropped and this keeps returning `Ok`.
    ///
    /// # Errors
    /// Returns [`PlotError::WorkerGone`] if the worker exited for any other reason.
    /// That is fatal; retrying will not help.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous runtime.
    pub fn on_epoch_end(&self, epoch: usize, metrics: impl Into<Metrics>) -> Result<()> {
        let Some(frames) = &self.frames else {
            return Err(PlotError::WorkerGone);
        };

        let frame = MetricsFrame::new(epoch, metrics.into());
        if frames.blocking_send(frame).is_ok() {
            return Ok(());
        }

        match self.status.exit_reason() {
            Some(ExitReason::WindowClosed) => {
                debug!("display closed, dropping metrics of epoch {epoch}");
                Ok(())
            }
            _ => Err(PlotError::WorkerGone),
        }
    }

    /// Ends the session.
    ///
    /// With `wait_for_worker` this blocks until the user closes the display;
    /// otherwise the worker is stopped right away, dropping anything not drawn
    /// yet. A stop is noticed within one redraw or about 50 ms of idling,
    /// however long the poll interval is. Either way it returns once the worker thread has been joined.
    ///
    /// # Errors
    /// Returns the error that stopped the worker, or [`PlotError::WorkerPanicked`].
    pub fn shutdown(mut self) -> Result<()> {
        self.finish()
    }

    pub fn state(&self) -> WorkerState {
        self.status.state()
    }

    /// Shared view of the worker lifecycle that outlives the sink.
    pub fn status(&self) -> Arc<WorkerStatus> {
        Arc::clone(&self.status)
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.status.exit_reason()
    }

    pub fn processed_frames(&self) -> usize {
        self.status.processed_frames()
    }

    pub fn rejected_frames(&self) -> usize {
        self.status.rejected_frames()
    }

    fn finish(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        // Lets the worker see the channel disconnect once it has drained it.
        self.frames.take();

        if self.wait_for_worker {
            info!("waiting for the display to be closed");
        } else {
            info!("terminating display");
            self.cancel.cancel();
        }

        worker.join().map_err(|_| PlotError::WorkerPanicked)?
    }
}

impl TrainingCallback for MetricSink {
    fn on_epoch_end(&mut self, epoch: usize, logs: &Metrics) -> Result<()> {
        MetricSink::on_epoch_end(self, epoch, logs.clone())
    }

    fn on_train_end(&mut self) -> Result<()> {
        self.finish()
    }
}

impl Drop for MetricSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            error!("display shutdown failed: {e}");
        }
    }
}
