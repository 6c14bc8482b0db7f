use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
    path::Path,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{PlotError, Result},
    style::StyleMap,
};

const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Metrics drawn together on one panel, sharing its y-axis.
///
/// In JSON a group is either a bare string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricGroup {
    Single(String),
    Many(Vec<String>),
}

impl MetricGroup {
    pub fn metrics(&self) -> &[String] {
        match self {
            Self::Single(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }
}

impl From<&str> for MetricGroup {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl<S: Into<String>> From<Vec<S>> for MetricGroup {
    fn from(names: Vec<S>) -> Self {
        Self::Many(names.into_iter().map(Into::into).collect())
    }
}

/// Construction-time settings of a [`crate::MetricSink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Panel layout; inferred from the first frame's keys when absent.
    pub groups: Option<Vec<MetricGroup>>,
    /// Metric name → style token, see [`crate::style::LineStyle`].
    pub styles: HashMap<String, String>,
    /// Block shutdown until the display is closed instead of stopping it.
    pub wait_for_worker: bool,
    /// Frames buffered before `on_epoch_end` blocks.
    pub channel_capacity: NonZeroUsize,
    /// Longest time the worker yields to the surface between empty polls.
    pub poll_interval_ms: u64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            groups: None,
            styles: HashMap::new(),
            wait_for_worker: true,
            channel_capacity: NonZeroUsize::new(DEFAULT_CHANNEL_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PlotConfig {
    pub fn with_groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<MetricGroup>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_style(mut self, metric: impl Into<String>, token: impl Into<String>) -> Self {
        self.styles.insert(metric.into(), token.into());
        self
    }

    pub fn wait_for_worker(mut self, wait: bool) -> Self {
        self.wait_for_worker = wait;
        self
    }

    pub fn channel_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis().max(1)).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parses a config from JSON text, filling missing fields with defaults.
    ///
    /// # Errors
    /// Returns [`PlotError::Json`] on malformed input and [`PlotError::InvalidConfig`]
    /// if the parsed config does not validate.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config from a JSON file.
    ///
    /// # Errors
    /// Same as [`PlotConfig::from_json_str`], plus [`PlotError::Io`] if the file
    /// cannot be read.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Checks the group and style specification.
    ///
    /// # Errors
    /// Returns [`PlotError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(PlotError::InvalidConfig(
                "poll_interval_ms must be positive".into(),
            ));
        }

        if let Some(groups) = &self.groups {
            let mut seen = HashSet::new();
            for (idx, group) in groups.iter().enumerate() {
                if group.metrics().is_empty() {
                    return Err(PlotError::InvalidConfig(format!("group {idx} is empty")));
                }
                for metric in group.metrics() {
                    if metric.trim().is_empty() {
                        return Err(PlotError::InvalidConfig(format!(
                            "group {idx} has an empty metric name"
                        )));
                    }
                    if !seen.insert(metric.as_str()) {
                        return Err(PlotError::InvalidConfig(format!(
                            "metric '{metric}' appears in more than one group"
                        )));
                    }
                }
            }
        }

        StyleMap::parse(&self.styles)?;
        Ok(())
    }
}
