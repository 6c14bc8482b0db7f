use std::{error::Error, fmt, io};

/// The crate's result type.
pub type Result<T> = std::result::Result<T, PlotError>;

/// All errors that can occur while plotting metrics.
#[derive(Debug)]
pub enum PlotError {
    /// Invalid group/style configuration, caught before the worker starts.
    InvalidConfig(String),
    /// A metric of the panel layout is missing from a later frame.
    MissingMetric { epoch: usize, metric: String },
    /// The first frame carries no metrics and no groups were configured.
    EmptyFrame { epoch: usize },
    /// The display worker thread could not be spawned.
    WorkerSpawn(io::Error),
    /// The display worker panicked.
    WorkerPanicked,
    /// The channel closed without the user closing the display.
    WorkerGone,
    /// The render surface failed to draw or to process its events.
    Surface(String),
    /// An underlying I/O error not covered by the above variants.
    Io(io::Error),
    /// The configuration file is not valid JSON.
    Json(serde_json::Error),
}

impl PlotError {
    /// Whether the error is a frame-level contract violation that the worker can
    /// skip without tearing down the display.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::MissingMetric { .. } | Self::EmptyFrame { .. })
    }
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::MissingMetric { epoch, metric } => {
                write!(f, "metric '{metric}' missing from epoch {epoch}")
            }
            Self::EmptyFrame { epoch } => {
                write!(f, "epoch {epoch} carries no metrics to lay out")
            }
            Self::WorkerSpawn(e) => write!(f, "cannot start display worker: {e}"),
            Self::WorkerPanicked => write!(f, "display worker panicked"),
            Self::WorkerGone => write!(f, "display worker exited unexpectedly"),
            Self::Surface(msg) => write!(f, "render surface error: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "invalid JSON: {e}"),
        }
    }
}

impl Error for PlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WorkerSpawn(e) | Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PlotError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PlotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
