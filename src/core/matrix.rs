//! Build matrix expansion

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One named matrix axis with its ordered candidate values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixAxis {
    pub name: String,
    pub values: Vec<String>,
}

/// A build matrix: ordered axes expanded into concrete job instances
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixSpec {
    axes: Vec<MatrixAxis>,
}

impl MatrixSpec {
    pub fn new(axes: Vec<MatrixAxis>) -> Self {
        Self { axes }
    }

    pub fn axes(&self) -> &[MatrixAxis] {
        &self.axes
    }

    /// Number of instances the matrix expands to.
    ///
    /// Product of axis lengths: 1 for a matrix with no axes, 0 as soon as
    /// any axis has no values.
    pub fn instance_count(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    /// Expand into the cartesian product of all axis values.
    ///
    /// Declared axis order is preserved; the last axis varies fastest. A
    /// matrix with no axes yields a single empty binding, an axis with no
    /// values yields no bindings at all.
    pub fn expand(&self) -> Vec<MatrixBinding> {
        let mut bindings = vec![MatrixBinding::default()];

        for axis in &self.axes {
            let mut expanded = Vec::with_capacity(bindings.len() * axis.values.len());
            for binding in &bindings {
                for value in &axis.values {
                    let mut next = binding.clone();
                    next.entries.push((axis.name.clone(), value.clone()));
                    expanded.push(next);
                }
            }
            bindings = expanded;
        }

        bindings
    }
}

/// One concrete assignment of a value to every matrix axis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixBinding {
    entries: Vec<(String, String)>,
}

impl MatrixBinding {
    /// Look up the value bound to an axis
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map form, for seeding a variable context
    pub fn as_map(&self) -> HashMap<String, String> {
        self.entries.iter().cloned().collect()
    }

    /// Human-readable instance label, e.g. `python-version=3.8`
    pub fn label(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
