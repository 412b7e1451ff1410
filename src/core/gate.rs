//! Quality gate evaluation over captured step output

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pattern used when a gate does not declare its own: a percentage figure
/// with one capture group. The last match wins, so a coverage table is read
/// at its TOTAL row.
pub const DEFAULT_METRIC_PATTERN: &str = r"(\d+(?:\.\d+)?)%";

/// A numeric quality threshold bound to one step's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum value the extracted metric must reach
    pub minimum: f64,

    /// Regex whose first capture group extracts the metric
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Why a gate did not pass
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GateError {
    /// The metric parsed but is under the configured minimum
    #[error("metric {metric} below minimum {minimum}")]
    BelowThreshold { metric: f64, minimum: f64 },

    /// No parsable metric in the output of an apparently successful step.
    /// Distinct from a threshold miss: the measurement itself failed.
    #[error("no metric matching '{pattern}' in step output")]
    InstrumentationBroken { pattern: String },
}

/// Extract the gate metric from captured output and compare it against the
/// configured minimum.
pub fn evaluate(config: &GateConfig, output: &str) -> Result<f64, GateError> {
    let pattern = config.pattern.as_deref().unwrap_or(DEFAULT_METRIC_PATTERN);
    let regex = Regex::new(pattern).map_err(|_| GateError::InstrumentationBroken {
        pattern: pattern.to_string(),
    })?;

    let metric = regex
        .captures_iter(output)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|group| group.as_str().parse::<f64>().ok())
        .ok_or_else(|| GateError::InstrumentationBroken {
            pattern: pattern.to_string(),
        })?;

    if metric < config.minimum {
        return Err(GateError::BelowThreshold {
            metric,
            minimum: config.minimum,
        });
    }

    Ok(metric)
}
