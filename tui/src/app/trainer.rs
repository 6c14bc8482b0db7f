use std::{thread, time::Duration};

use log::info;
use realtime_plotting::{Metrics, Result, TrainingCallback};

/// Stand-in for a training loop: produces smooth, slightly noisy learning curves.
pub struct SimulatedTrainer {
    epochs: usize,
    epoch_time: Duration,
}

impl SimulatedTrainer {
    pub fn new(epochs: usize, epoch_time: Duration) -> Self {
        Self { epochs, epoch_time }
    }

    /// Runs every epoch, reporting to each callback in order, then ends training.
    ///
    /// # Errors
    /// Stops at the first callback error.
    pub fn fit(&self, callbacks: &mut [&mut dyn TrainingCallback]) -> Result<()> {
        info!("training for {} epoch(s)", self.epochs);

        for epoch in 0..self.epochs {
            thread::sleep(self.epoch_time);
            let logs = Self::metrics_at(epoch);
            for callback in callbacks.iter_mut() {
                callback.on_epoch_end(epoch, &logs)?;
            }
        }

        info!("training finished");
        for callback in callbacks.iter_mut() {
            callback.on_train_end()?;
        }
        Ok(())
    }

    pub fn metrics_at(epoch: usize) -> Metrics {
        let t = epoch as f64;
        let loss = 1.0 / (1.0 + 0.25 * t) + 0.02 * (1.7 * t).sin();
        let val_loss = 1.1 * loss + 0.03 * (0.9 * t).cos().abs();
        let acc = 1.0 - 0.9 * (-0.15 * t).exp();
        let val_acc = acc - 0.03 - 0.01 * (1.3 * t).sin().abs();

        Metrics::from([
            ("loss", loss),
            ("val_loss", val_loss),
            ("acc", acc),
            ("val_acc", val_acc),
        ])
    }
}
