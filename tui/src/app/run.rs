use std::{env, time::Duration};

use anyhow::{Context, Result};
use log::info;
use realtime_plotting::{MetricGroup, MetricSink, PlotConfig, PlotError, TrainingCallback};

use super::trainer::SimulatedTrainer;
use crate::surface::TerminalSurface;

const DEFAULT_EPOCHS: usize = 60;
const EPOCH_TIME: Duration = Duration::from_millis(250);

/// Runs a simulated training session with live terminal charts.
///
/// Usage: `tui [config.json]`, with the epoch count read from `EPOCHS`.
///
/// # Errors
/// Returns an error if the config is invalid, the terminal cannot be set up or
/// the display worker fails.
pub fn run() -> Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => PlotConfig::from_json_file(&path)
            .with_context(|| format!("cannot load config '{path}'"))?,
        None => default_config(),
    };

    let epochs = match env::var("EPOCHS") {
        Ok(v) => v.parse().context("EPOCHS must be a non-negative integer")?,
        Err(_) => DEFAULT_EPOCHS,
    };

    let mut sink = MetricSink::configure(config, || {
        TerminalSurface::enter().map_err(PlotError::from)
    })?;
    let status = sink.status();

    SimulatedTrainer::new(epochs, EPOCH_TIME).fit(&mut [&mut sink as &mut dyn TrainingCallback])?;

    info!("display closed: {:?}", status.exit_reason());
    println!(
        "plotted {} epoch(s), rejected {}",
        status.processed_frames(),
        status.rejected_frames()
    );
    Ok(())
}

fn default_config() -> PlotConfig {
    PlotConfig::default()
        .with_groups([
            MetricGroup::from(vec!["loss", "val_loss"]),
            MetricGroup::from(vec!["acc", "val_acc"]),
        ])
        .with_style("loss", "r-")
        .with_style("val_loss", "b--")
        .with_style("acc", "g-")
        .with_style("val_acc", "m--")
        .poll_interval(Duration::from_millis(120))
}
