use std::{collections::HashMap, fmt, str::FromStr};

use crate::error::{PlotError, Result};

/// Token used for every metric without an explicit style.
pub const DEFAULT_STYLE: &str = "r--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineColor {
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
    Black,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePattern {
    Solid,
    Dashed,
    Dotted,
    DashDot,
    Points,
}

/// Draw style of a single series, parsed from a short token such as `"b-"` or `"g:"`.
///
/// A token is an optional colour letter followed by an optional line pattern.
/// Parts left out fall back to the ones of [`DEFAULT_STYLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    pub color: LineColor,
    pub pattern: LinePattern,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: LineColor::Red,
            pattern: LinePattern::Dashed,
        }
    }
}

impl FromStr for LineStyle {
    type Err = PlotError;

    fn from_str(token: &str) -> Result<Self> {
        let token = token.trim();
        let default = Self::default();

        let (color, rest) = match token.chars().next().and_then(color_of) {
            Some(color) => (color, &token[1..]),
            None => (default.color, token),
        };

        let pattern = match rest {
            "" => default.pattern,
            "-" => LinePattern::Solid,
            "--" => LinePattern::Dashed,
            ":" => LinePattern::Dotted,
            "-." => LinePattern::DashDot,
            "." | "o" => LinePattern::Points,
            other => {
                return Err(PlotError::InvalidConfig(format!(
                    "unknown line pattern '{other}' in style '{token}'"
                )))
            }
        };

        Ok(Self { color, pattern })
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = match self.color {
            LineColor::Red => 'r',
            LineColor::Green => 'g',
            LineColor::Blue => 'b',
            LineColor::Cyan => 'c',
            LineColor::Magenta => 'm',
            LineColor::Yellow => 'y',
            LineColor::Black => 'k',
            LineColor::White => 'w',
        };
        let pattern = match self.pattern {
            LinePattern::Solid => "-",
            LinePattern::Dashed => "--",
            LinePattern::Dotted => ":",
            LinePattern::DashDot => "-.",
            LinePattern::Points => ".",
        };
        write!(f, "{color}{pattern}")
    }
}

fn color_of(c: char) -> Option<LineColor> {
    match c {
        'r' => Some(LineColor::Red),
        'g' => Some(LineColor::Green),
        'b' => Some(LineColor::Blue),
        'c' => Some(LineColor::Cyan),
        'm' => Some(LineColor::Magenta),
        'y' => Some(LineColor::Yellow),
        'k' => Some(LineColor::Black),
        'w' => Some(LineColor::White),
        _ => None,
    }
}

/// Parsed per-metric styles.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    styles: HashMap<String, LineStyle>,
}

impl StyleMap {
    /// Parses every token of a raw name → token map.
    ///
    /// # Errors
    /// Returns [`PlotError::InvalidConfig`] naming the metric whose token is malformed.
    pub fn parse(raw: &HashMap<String, String>) -> Result<Self> {
        let styles = raw
            .iter()
            .map(|(metric, token)| {
                let style = token.parse::<LineStyle>().map_err(|e| {
                    PlotError::InvalidConfig(format!("style of '{metric}': {e}"))
                })?;
                Ok((metric.clone(), style))
            })
            .collect::<Result<_>>()?;

        Ok(Self { styles })
    }

    /// Style of `metric`, or the default one when unmapped.
    pub fn resolve(&self, metric: &str) -> LineStyle {
        self.styles.get(metric).copied().unwrap_or_default()
    }
}
