//! Variable scoping and substitution for step commands

use crate::core::matrix::MatrixBinding;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// A `${{ ... }}` reference no scope can resolve
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved variable reference '{0}'")]
pub struct UnresolvedVariable(pub String);

const REFERENCE_PATTERN: &str = r"\$\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.-]*)\s*\}\}";

/// All `${{ ... }}` references appearing in a template, in order
pub fn scan_references(template: &str) -> Vec<String> {
    let reference = Regex::new(REFERENCE_PATTERN).expect("reference pattern is valid");
    reference
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Scoped variables for one job instance.
///
/// Resolution precedence: matrix bindings, then workflow-level defaults,
/// then platform built-ins. Namespaced references (`matrix.*`, `env.*`,
/// `runner.*`) address a single scope directly. The context is read-only
/// once the instance is prepared.
#[derive(Debug, Clone)]
pub struct VariableContext {
    matrix: HashMap<String, String>,
    defaults: HashMap<String, String>,
    builtins: HashMap<String, String>,
    reference: Regex,
}

impl VariableContext {
    pub fn new(defaults: HashMap<String, String>, platform: &str) -> Self {
        let mut builtins = HashMap::new();
        builtins.insert("platform".to_string(), platform.to_string());
        builtins.insert("os".to_string(), os_for_platform(platform).to_string());

        Self {
            matrix: HashMap::new(),
            defaults,
            builtins,
            reference: Regex::new(REFERENCE_PATTERN).expect("reference pattern is valid"),
        }
    }

    /// Overlay the matrix binding of one instance
    pub fn with_matrix(mut self, binding: &MatrixBinding) -> Self {
        self.matrix = binding.as_map();
        self
    }

    /// Resolve a variable reference to its value
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some(key) = name.strip_prefix("matrix.") {
            return self.matrix.get(key).map(String::as_str);
        }
        if let Some(key) = name.strip_prefix("env.") {
            return self.defaults.get(key).map(String::as_str);
        }
        if let Some(key) = name.strip_prefix("runner.") {
            return self.builtins.get(key).map(String::as_str);
        }

        self.matrix
            .get(name)
            .or_else(|| self.defaults.get(name))
            .or_else(|| self.builtins.get(name))
            .map(String::as_str)
    }

    /// Replace every `${{ name }}` reference in the template.
    ///
    /// Fails on the first unbound reference; substitution never leaves a
    /// reference in place for an invoked tool to trip over.
    pub fn substitute(&self, template: &str) -> Result<String, UnresolvedVariable> {
        for caps in self.reference.captures_iter(template) {
            let name = &caps[1];
            if self.resolve(name).is_none() {
                return Err(UnresolvedVariable(name.to_string()));
            }
        }

        let substituted = self
            .reference
            .replace_all(template, |caps: &regex::Captures<'_>| {
                self.resolve(&caps[1]).unwrap_or_default().to_string()
            });
        Ok(substituted.into_owned())
    }

    /// Environment exported to invoked commands: workflow defaults overlaid
    /// with the instance's matrix binding.
    pub fn exported_env(&self) -> HashMap<String, String> {
        let mut env = self.defaults.clone();
        for (key, value) in &self.matrix {
            env.insert(key.clone(), value.clone());
        }
        env
    }
}

fn os_for_platform(platform: &str) -> &'static str {
    if platform.starts_with("macos") {
        "macos"
    } else if platform.starts_with("windows") {
        "windows"
    } else {
        "linux"
    }
}
