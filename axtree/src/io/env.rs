//! Environment abstraction for the browser the agent drives.
//!
//! The [`Environment`] trait decouples the session from the actual browser
//! backend. Tests use scripted environments that replay predetermined
//! observations without a browser.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::Action;
use crate::io::observation::Observation;

/// Outcome of one environment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    #[serde(default)]
    pub reward: f64,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub truncated: bool,
    /// Backend-specific details, recorded verbatim in the low-level log.
    #[serde(default)]
    pub info: Value,
}

/// Abstraction over browser backends.
pub trait Environment {
    /// Execute one action and return the resulting observation.
    fn step(&mut self, action: &Action) -> Result<StepResult>;

    /// Normalized `(x, y)` centre of an element in the viewport. Values in
    /// `0.0..=1.0` are on screen.
    fn element_center(&mut self, element_id: i64) -> Result<(f64, f64)>;
}
