use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Condvar, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use realtime_plotting::{
    ChartState, ExitReason, HeadlessHandle, HeadlessSurface, MetricGroup, MetricSink, Metrics,
    PlotConfig, PlotError, RenderSurface, SurfaceEvent, TrainingCallback, WorkerState,
};
use tokio_test::{assert_err, assert_ok};

const DEADLINE: Duration = Duration::from_secs(5);

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> PlotConfig {
    PlotConfig::default().poll_interval(Duration::from_millis(5))
}

fn headless(config: PlotConfig) -> (MetricSink, HeadlessHandle) {
    init_logger();
    let (surface, handle) = HeadlessSurface::pair();
    let sink = MetricSink::configure(config, move || Ok(surface)).unwrap();
    (sink, handle)
}

/// Polls `cond` until it holds or the deadline passes.
fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < DEADLINE {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    cond()
}

fn metrics(values: &[(&str, f64)]) -> Metrics {
    values.iter().map(|(k, v)| (*k, *v)).collect()
}

#[test]
fn frames_are_drawn_in_call_order() {
    let (sink, handle) = headless(config());

    for epoch in 0..20 {
        assert_ok!(sink.on_epoch_end(epoch, [("loss", 1.0 / (epoch + 1) as f64)]));
    }

    assert!(wait_until(|| handle.rendered_epochs().len() == 20));
    assert_eq!(handle.rendered_epochs(), (0..20).collect::<Vec<_>>());

    handle.close();
    assert_ok!(sink.shutdown());
}

#[test]
fn layout_is_inferred_from_first_frame_keys() {
    let (sink, handle) = headless(config().wait_for_worker(false));

    assert_ok!(sink.on_epoch_end(0, [("loss", 0.5), ("acc", 0.9)]));

    assert!(wait_until(|| handle.panels().is_some()));
    assert_eq!(
        handle.panels().unwrap(),
        [vec!["loss".to_string()], vec!["acc".to_string()]]
    );
    assert_ok!(sink.shutdown());
}

#[test]
fn explicit_groups_define_the_panels() {
    let config = config()
        .wait_for_worker(false)
        .with_groups([MetricGroup::from(vec!["loss", "val_loss"]), MetricGroup::from("acc")]);
    let (sink, handle) = headless(config);

    assert_ok!(sink.on_epoch_end(0, [("acc", 0.2), ("val_loss", 1.1), ("loss", 1.0)]));

    assert!(wait_until(|| handle.latest().is_some()));
    let chart = handle.latest().unwrap();
    let legends = chart
        .panels()
        .iter()
        .map(|p| p.legend().collect::<Vec<_>>())
        .collect::<Vec<_>>();
    assert_eq!(legends, [vec!["loss", "val_loss"], vec!["acc"]]);
    assert_ok!(sink.shutdown());
}

#[test]
fn series_accumulate_one_point_per_epoch() {
    let (sink, handle) = headless(config().wait_for_worker(false));
    let losses = [0.9, 0.6, 0.45, 0.4, 0.38];

    for (epoch, loss) in losses.iter().enumerate() {
        assert_ok!(sink.on_epoch_end(epoch, [("loss", *loss)]));
    }

    assert!(wait_until(|| handle.rendered_epochs().len() == losses.len()));
    let chart = handle.latest().unwrap();
    let series = chart.series("loss").unwrap();
    assert_eq!(series.xs().collect::<Vec<_>>(), [0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(series.ys().collect::<Vec<_>>(), losses);
    assert_ok!(sink.shutdown());
}

#[test]
fn missing_metric_is_rejected_and_reported() {
    let (sink, handle) = headless(config().wait_for_worker(false));

    assert_ok!(sink.on_epoch_end(0, [("loss", 1.0), ("acc", 0.1)]));
    assert_ok!(sink.on_epoch_end(1, [("loss", 0.9)]));
    assert_ok!(sink.on_epoch_end(2, [("loss", 0.8), ("acc", 0.3), ("lr", 0.01)]));

    assert!(wait_until(|| sink.processed_frames() == 2 && sink.rejected_frames() == 1));
    assert_eq!(handle.rendered_epochs(), [0, 2]);
    assert_eq!(sink.state(), WorkerState::Running);

    let chart = handle.latest().unwrap();
    assert_eq!(chart.series("acc").unwrap().ys().collect::<Vec<_>>(), [0.1, 0.3]);
    assert!(chart.series("lr").is_none());
    assert_ok!(sink.shutdown());
}

#[test]
fn shutdown_waits_for_the_display_to_be_closed() {
    let (sink, handle) = headless(config());
    let status = sink.status();
    assert_ok!(sink.on_epoch_end(0, [("loss", 1.0)]));

    let (done_tx, done_rx) = mpsc::channel();
    let waiter = thread::spawn(move || {
        let _ = done_tx.send(sink.shutdown());
    });

    assert!(done_rx.recv_timeout(Duration::from_millis(300)).is_err());
    assert_ne!(status.state(), WorkerState::Closed);

    handle.close();
    let result = done_rx.recv_timeout(DEADLINE).unwrap();
    waiter.join().unwrap();

    assert_ok!(result);
    assert_eq!(status.state(), WorkerState::Closed);
    assert_eq!(status.exit_reason(), Some(ExitReason::WindowClosed));
}

#[test]
fn shutdown_without_waiting_stops_the_worker_promptly() {
    let (sink, _handle) = headless(config().wait_for_worker(false));
    let status = sink.status();
    for epoch in 0..5 {
        assert_ok!(sink.on_epoch_end(epoch, [("loss", 1.0)]));
    }

    let started = Instant::now();
    assert_ok!(sink.shutdown());

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(status.state(), WorkerState::Closed);
    assert_eq!(status.exit_reason(), Some(ExitReason::Cancelled));
}

#[test]
fn dropping_the_sink_shuts_it_down() {
    let (sink, _handle) = headless(config().wait_for_worker(false));
    let status = sink.status();
    assert_ok!(sink.on_epoch_end(0, [("loss", 1.0)]));

    drop(sink);

    assert_eq!(status.state(), WorkerState::Closed);
}

#[test]
fn training_continues_after_the_user_closes_the_display() {
    let (sink, handle) = headless(config().wait_for_worker(false));
    assert_ok!(sink.on_epoch_end(0, [("loss", 1.0)]));
    assert!(wait_until(|| !handle.rendered_epochs().is_empty()));

    handle.close();
    assert!(wait_until(|| sink.state() == WorkerState::Closed));

    for epoch in 1..10 {
        assert_ok!(sink.on_epoch_end(epoch, [("loss", 1.0)]));
    }
    assert_eq!(sink.exit_reason(), Some(ExitReason::WindowClosed));
    assert_eq!(handle.rendered_epochs(), [0]);
    assert_ok!(sink.shutdown());
}

#[test]
fn callback_trait_forwards_epochs_and_ends_training() {
    let (mut sink, handle) = headless(config().wait_for_worker(false));
    let status = sink.status();

    {
        let callback: &mut dyn TrainingCallback = &mut sink;
        for epoch in 0..3 {
            assert_ok!(callback.on_epoch_end(epoch, &metrics(&[("loss", 0.5)])));
        }
    }
    assert!(wait_until(|| handle.rendered_epochs().len() == 3));

    assert_ok!(TrainingCallback::on_train_end(&mut sink));
    assert_eq!(status.state(), WorkerState::Closed);
    // Shutdown already ran.
    assert_ok!(sink.shutdown());
}

#[test]
fn failing_surface_fails_configure() {
    init_logger();
    let result = MetricSink::configure(config(), || {
        Err::<HeadlessSurface, _>(PlotError::Surface("no display".into()))
    });

    assert!(matches!(result, Err(PlotError::Surface(_))));
}

#[test]
fn invalid_config_fails_configure() {
    init_logger();
    let config = config().with_style("loss", "not-a-style");

    let result = MetricSink::configure(config, || Ok(HeadlessSurface::pair().0));

    assert!(matches!(result, Err(PlotError::InvalidConfig(_))));
}

/// Headless surface whose redraws block until the gate opens.
struct GatedSurface {
    inner: HeadlessSurface,
    gate: Arc<(Mutex<bool>, Condvar)>,
}

impl RenderSurface for GatedSurface {
    fn init(&mut self, chart: &ChartState) -> realtime_plotting::Result<()> {
        self.inner.init(chart)
    }

    fn render(&mut self, chart: &ChartState) -> realtime_plotting::Result<()> {
        let (open, cvar) = &*self.gate;
        let guard = open.lock().unwrap();
        let _guard = cvar.wait_while(guard, |open| !*open).unwrap();
        self.inner.render(chart)
    }

    fn pump(&mut self, timeout: Duration) -> realtime_plotting::Result<SurfaceEvent> {
        self.inner.pump(timeout)
    }
}

#[test]
fn full_channel_blocks_the_producer() {
    init_logger();
    let gate = Arc::new((Mutex::new(false), Condvar::new()));
    let (inner, handle) = HeadlessSurface::pair();
    let surface = GatedSurface {
        inner,
        gate: Arc::clone(&gate),
    };

    let config = config()
        .wait_for_worker(false)
        .channel_capacity(NonZeroUsize::new(1).unwrap());
    let sink = MetricSink::configure(config, move || Ok(surface)).unwrap();
    let sent = AtomicUsize::new(0);

    thread::scope(|s| {
        s.spawn(|| {
            for epoch in 0..3 {
                sink.on_epoch_end(epoch, [("loss", 1.0)]).unwrap();
                sent.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Epoch 0 is stuck in a redraw, epoch 1 fills the channel, epoch 2 waits.
        thread::sleep(Duration::from_millis(300));
        assert_eq!(sent.load(Ordering::SeqCst), 2);

        let (open, cvar) = &*gate;
        *open.lock().unwrap() = true;
        cvar.notify_all();

        assert!(wait_until(|| sent.load(Ordering::SeqCst) == 3));
    });

    assert!(wait_until(|| handle.rendered_epochs().len() == 3));
    assert_ok!(sink.shutdown());
}

#[test]
fn closing_the_display_releases_a_blocked_producer() {
    init_logger();
    let gate = Arc::new((Mutex::new(false), Condvar::new()));
    let (inner, handle) = HeadlessSurface::pair();
    let surface = GatedSurface {
        inner,
        gate: Arc::clone(&gate),
    };

    let config = config()
        .wait_for_worker(false)
        .channel_capacity(NonZeroUsize::new(1).unwrap());
    let sink = MetricSink::configure(config, move || Ok(surface)).unwrap();
    let sent = AtomicUsize::new(0);

    let results = thread::scope(|s| {
        let producer = s.spawn(|| {
            (0..4)
                .map(|epoch| {
                    let result = sink.on_epoch_end(epoch, [("loss", 1.0)]);
                    sent.fetch_add(1, Ordering::SeqCst);
                    result
                })
                .collect::<Vec<_>>()
        });

        // Epoch 0 is stuck in a redraw, epoch 1 fills the channel, epoch 2 waits.
        thread::sleep(Duration::from_millis(300));
        assert_eq!(sent.load(Ordering::SeqCst), 2);

        handle.close();
        let (open, cvar) = &*gate;
        *open.lock().unwrap() = true;
        cvar.notify_all();

        producer.join().unwrap()
    });

    assert_eq!(results.len(), 4);
    for result in results {
        assert_ok!(result);
    }
    assert_eq!(sink.exit_reason(), Some(ExitReason::WindowClosed));
    assert_eq!(handle.rendered_epochs(), [0]);
    assert_ok!(sink.shutdown());
}

#[test]
fn shutdown_without_waiting_ignores_a_long_poll_interval() {
    let config = PlotConfig::default()
        .wait_for_worker(false)
        .poll_interval(Duration::from_secs(10));
    let (sink, handle) = headless(config);
    assert_ok!(sink.on_epoch_end(0, [("loss", 1.0)]));
    assert!(wait_until(|| !handle.rendered_epochs().is_empty()));

    let started = Instant::now();
    assert_ok!(sink.shutdown());

    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn on_epoch_end_fails_once_the_worker_died() {
    init_logger();
    let (inner, _handle) = HeadlessSurface::pair();
    let surface = FailingSurface { inner };
    let sink = MetricSink::configure(config(), move || Ok(surface)).unwrap();

    assert_ok!(sink.on_epoch_end(0, [("loss", 1.0)]));
    assert!(wait_until(|| sink.state() == WorkerState::Closed));

    assert_eq!(sink.exit_reason(), Some(ExitReason::Failed));
    assert!(matches!(
        sink.on_epoch_end(1, [("loss", 1.0)]),
        Err(PlotError::WorkerGone)
    ));
    assert_err!(sink.shutdown());
}

/// Headless surface that cannot draw.
struct FailingSurface {
    inner: HeadlessSurface,
}

impl RenderSurface for FailingSurface {
    fn init(&mut self, chart: &ChartState) -> realtime_plotting::Result<()> {
        self.inner.init(chart)
    }

    fn render(&mut self, _chart: &ChartState) -> realtime_plotting::Result<()> {
        Err(PlotError::Surface("device lost".into()))
    }

    fn pump(&mut self, timeout: Duration) -> realtime_plotting::Result<SurfaceEvent> {
        self.inner.pump(timeout)
    }
}
