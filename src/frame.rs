/// One epoch's metric values, keyed by name in the order they were first inserted.
///
/// Training frameworks report metrics as a mapping, but the panel layout inferred
/// from the first epoch must follow the order the keys were observed in, so this
/// keeps them in a vector rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    entries: Vec<(String, f64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, keeping the original position of an existing key.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == name).then_some(*v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Metrics {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut metrics = Self::new();
        for (k, v) in iter {
            metrics.insert(k, v);
        }
        metrics
    }
}

impl<K: Into<String>, const N: usize> From<[(K, f64); N]> for Metrics {
    fn from(entries: [(K, f64); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// The unit exchanged across the channel: one epoch and its metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsFrame {
    pub epoch: usize,
    pub values: Metrics,
}

impl MetricsFrame {
    pub fn new(epoch: usize, values: Metrics) -> Self {
        Self { epoch, values }
    }
}
